use qtty::Degrees;

/// Pointing target of an observation, immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub name: String,
    pub ra: Degrees,
    pub dec: Degrees,
}

impl Target {
    pub fn new(name: impl Into<String>, ra: Degrees, dec: Degrees) -> Self {
        Self {
            name: name.into(),
            ra,
            dec,
        }
    }
}
