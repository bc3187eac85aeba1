//! Mapping from driven-port persistence errors to domain errors.

use crate::domain::Error;
use crate::domain::ports::{OperationPersistenceError, UserPersistenceError};

pub(crate) fn map_operation_store_error(error: OperationPersistenceError) -> Error {
    match error {
        OperationPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("operation store unavailable: {message}"))
        }
        OperationPersistenceError::Query { message } => {
            Error::internal(format!("operation store error: {message}"))
        }
    }
}

pub(crate) fn map_user_repository_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(OperationPersistenceError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(OperationPersistenceError::query("syntax"), ErrorCode::InternalError)]
    fn operation_store_errors_map_by_retryability(
        #[case] error: OperationPersistenceError,
        #[case] expected: ErrorCode,
    ) {
        assert_eq!(map_operation_store_error(error).code(), expected);
    }

    #[rstest]
    #[case(UserPersistenceError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(UserPersistenceError::query("syntax"), ErrorCode::InternalError)]
    fn user_repository_errors_map_by_retryability(
        #[case] error: UserPersistenceError,
        #[case] expected: ErrorCode,
    ) {
        assert_eq!(map_user_repository_error(error).code(), expected);
    }
}
