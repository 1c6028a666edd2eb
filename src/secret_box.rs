//! A container enforcing that the secrets it holds
//! do not outlive their usage in cleartext form.

use zeroize::Zeroize;

/// A wrapper for secret values ensuring the contents
/// are zeroized when the object goes out of scope.
pub(crate) struct SecretBox<T: Zeroize>(T);

impl<T: Zeroize> SecretBox<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(value)
    }

    pub(crate) fn as_secret(&self) -> &T {
        &self.0
    }
}

impl<T: Zeroize> Drop for SecretBox<T> {
    fn drop(&mut self) {
        self.0.zeroize()
    }
}
