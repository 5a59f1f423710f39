/// Unwraps a `Result` inside a `next()` that yields `Option<Result<T, E>>`.
///
/// `Ok(t)` evaluates to `t`; `Err(e)` makes the enclosing function return `Some(Err(e))`.
/// Used by line-oriented readers that surface per-item failures through the iterator.
#[macro_export]
macro_rules! try_or_ret_some_err {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => {
                return Some(Err(err.into()));
            }
        }
    };
}
