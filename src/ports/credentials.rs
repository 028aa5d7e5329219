/// Process-wide bearer-token source. The HTTP client reads the token fresh
/// on every call instead of caching it, so a login or logout is immediately
/// visible to subsequent requests.
pub trait CredentialProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}
