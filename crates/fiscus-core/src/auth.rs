use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// MunicipalityId
///
/// Opaque tenant identifier. The compiler refuses to build a plan without
/// one; a blank id is treated as absent rather than as a real scope.
///

#[derive(Clone, Debug, Display, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct MunicipalityId(String);

impl MunicipalityId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id carries no usable scope.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

///
/// AuthContext
///
/// Authorization facts supplied by the caller's session: the mandatory
/// municipality scope and the role label recorded on every audit row.
/// This core never derives or defaults either value.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuthContext {
    municipality: Option<MunicipalityId>,
    user_type: String,
}

impl AuthContext {
    #[must_use]
    pub fn new(municipality: MunicipalityId, user_type: impl Into<String>) -> Self {
        Self {
            municipality: Some(municipality),
            user_type: user_type.into(),
        }
    }

    /// A context with no tenant scope. Compilation against it always fails;
    /// it exists so unscoped sessions can still be audited.
    #[must_use]
    pub fn unscoped(user_type: impl Into<String>) -> Self {
        Self {
            municipality: None,
            user_type: user_type.into(),
        }
    }

    /// The tenant scope, if one is present and non-blank.
    #[must_use]
    pub fn municipality(&self) -> Option<&MunicipalityId> {
        self.municipality.as_ref().filter(|id| !id.is_blank())
    }

    #[must_use]
    pub fn user_type(&self) -> &str {
        &self.user_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_municipality_is_treated_as_absent() {
        let ctx = AuthContext::new(MunicipalityId::new("  "), "citizen");
        assert!(ctx.municipality().is_none());

        let ctx = AuthContext::new(MunicipalityId::new("mun-001"), "citizen");
        assert_eq!(ctx.municipality().unwrap().as_str(), "mun-001");
    }

    #[test]
    fn unscoped_context_has_no_municipality() {
        assert!(AuthContext::unscoped("analyst").municipality().is_none());
    }
}
