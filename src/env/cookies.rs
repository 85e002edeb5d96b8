use crate::common::errors::EnvError;

/// The page's view of its cookie jar, shaped like `document.cookie`.
pub trait CookieJar {
    /// Every cookie visible to script, as `name=value; name2=value2`
    fn read_all(&self) -> Result<String, EnvError>;

    /// Write one cookie string, attributes included
    /// (`name=; expires=...; path=/; domain=.example.com`)
    fn write(&self, cookie: &str) -> Result<(), EnvError>;
}
