//! # Error Types
//!
//! Domain-specific error types for tillpoint-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tillpoint-core errors (this file)                                     │
//! │  ├── CoreError        - Domain errors (the sale taxonomy)              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tillpoint-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  REST API errors (in app)                                              │
//! │  └── ApiError         - What the dashboard sees (JSON envelope)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → HTTP response          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, ID, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These are the error taxonomy of the sale transaction engine. Every
/// variant is raised before any mutation, except `InsufficientStock`,
/// which can also come back from the commit step after a full rollback.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    ///
    /// ## When This Occurs
    /// - Product ID doesn't exist in the catalog
    /// - Product was soft-deleted (inactive products are not for sale)
    #[error("Product {0} not found")]
    ProductNotFound(String),

    /// Customer referenced by a sale does not exist.
    #[error("Customer {0} not found")]
    CustomerNotFound(String),

    /// Sale cannot be found.
    #[error("Sale {0} not found")]
    SaleNotFound(String),

    /// Insufficient stock to complete sale.
    ///
    /// ## User Workflow
    /// ```text
    /// Submit cart (Widget × 5)
    ///      │
    ///      ▼
    /// Check stock: available=3   (pre-check OR conditional decrement)
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Widget", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Dashboard shows: "Insufficient stock for Widget"
    /// ```
    ///
    /// `available` is the value observed at the time of the failure. For
    /// a commit-time failure it is re-read inside the rolled back
    /// transaction and may already be stale.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Sale has no line items.
    #[error("Sale items required")]
    EmptyCart,

    /// Cart has exceeded maximum allowed items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// A line subtotal or sale total does not fit in the money range.
    #[error("Sale amounts are out of range")]
    AmountOutOfRange,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The store failed for a reason unrelated to the request.
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl CoreError {
    /// True for errors caused by the request itself (the caller can fix
    /// them), false for storage failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CoreError::Storage(_))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must be non-negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
