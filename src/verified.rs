/// Values that have passed an input filter's validation.
///
/// `Verified<T>` can only be produced inside this crate, by
/// [`InputFilter::verified_values`](crate::input_filter::InputFilter::verified_values)
/// after a successful [`is_valid`](crate::input_filter::InputFilterInterface::is_valid).
/// Code that accepts a `Verified<T>` therefore knows the data went through
/// the filter and validator chains.
///
/// There is no public constructor and no `From<T>` impl. Access is explicit
/// through [`AsRef::as_ref`] or [`into_inner`](Self::into_inner); there is no
/// `Deref` and no `Default`.
///
/// ```compile_fail
/// use input_filter::Verified;
///
/// let verified = Verified::new_unchecked(serde_json::Map::new());
/// ```
///
/// ```
/// use input_filter::input::Input;
/// use input_filter::input_filter::{InputFilter, InputFilterInterface};
/// use serde_json::json;
///
/// let mut form = InputFilter::new();
/// form.add(Input::new("name"));
/// form.set_data(json!({"name": "bob"}).as_object().unwrap().clone());
/// assert!(form.is_valid(None).unwrap());
///
/// let values = form.verified_values().unwrap();
/// assert_eq!(values.as_ref()["name"], json!("bob"));
/// let map = values.into_inner();
/// assert_eq!(map.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<T> {
    inner: T,
}

impl<T> Verified<T> {
    /// Wraps a value without checking it.
    ///
    /// Callers must have validated `value` first.
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self { inner: value }
    }

    /// Consumes the wrapper and returns the value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> AsRef<T> for Verified<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}
