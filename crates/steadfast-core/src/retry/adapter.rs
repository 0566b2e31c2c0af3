//! Turning an async function into a retrying one

use std::future::Future;

use super::error::RetryableError;
use super::executor::execute;
use super::options::RetryOptions;

/// An async function bundled with the retry options applied to every call
///
/// Arguments are passed as a single value (use a tuple for several) and
/// cloned into each attempt.
pub struct Retryable<F, E> {
    f: F,
    options: RetryOptions<E>,
}

impl<F: Clone, E> Clone for Retryable<F, E> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            options: self.options.clone(),
        }
    }
}

/// Wrap `f` so every call goes through the retry executor with `options`
///
/// # Example
///
/// ```rust,no_run
/// use steadfast_core::retry::{make_retryable, OperationError, RetryOptions};
///
/// async fn lookup(book: String, chapter: u32) -> Result<String, OperationError> {
///     Ok(format!("{} {}", book, chapter))
/// }
///
/// async fn example() -> Result<(), OperationError> {
///     let lookup = make_retryable(
///         |(book, chapter): (String, u32)| lookup(book, chapter),
///         RetryOptions::new().named("verse-lookup"),
///     );
///     let passage = lookup.call(("Psalms".to_string(), 23)).await?;
///     println!("{}", passage);
///     Ok(())
/// }
/// ```
pub fn make_retryable<F, E>(f: F, options: RetryOptions<E>) -> Retryable<F, E> {
    Retryable { f, options }
}

impl<F, E> Retryable<F, E> {
    /// Call the wrapped function with retries
    pub async fn call<A, Fut, T>(&self, args: A) -> Result<T, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        A: Clone,
        E: RetryableError,
    {
        execute(|| (self.f)(args.clone()), self.options.clone()).await
    }

    /// The options applied to every call
    pub fn options(&self) -> &RetryOptions<E> {
        &self.options
    }
}
