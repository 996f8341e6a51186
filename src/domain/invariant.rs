//! Invariant checking for command handlers.

use super::DomainError;

/// Assert a command precondition.
///
/// Returns `Err` with the error built by `violation` when `condition` is false.
/// Handlers chain these with `?`, cheapest check first, so the first violation
/// aborts the command before any event is raised.
pub fn invariant<F>(condition: bool, violation: F) -> Result<(), DomainError>
where
    F: FnOnce() -> DomainError,
{
    if condition {
        Ok(())
    } else {
        Err(violation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_holds() {
        assert_eq!(invariant(true, || DomainError::ClientNotFound), Ok(()));
    }

    #[test]
    fn test_invariant_violated() {
        let result = invariant(false, || DomainError::ClientAlreadyArchived);
        assert_eq!(result, Err(DomainError::ClientAlreadyArchived));
    }

    #[test]
    fn test_invariant_short_circuits() {
        fn checks() -> Result<u32, DomainError> {
            invariant(false, || DomainError::ClientNotFound)?;
            invariant(false, || DomainError::ClientNotArchived)?;
            Ok(1)
        }

        assert_eq!(checks(), Err(DomainError::ClientNotFound));
    }
}
