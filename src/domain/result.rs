//! Result type alias for Redakt
//!
//! This module provides a convenient Result type alias that uses RedaktError
//! as the error type.

use super::errors::RedaktError;

/// Result type alias for Redakt operations
///
/// # Examples
///
/// ```
/// use redakt::domain::result::Result;
/// use redakt::domain::errors::RedaktError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(RedaktError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, RedaktError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::RedaktError;

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(RedaktError::Validation("test error".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
