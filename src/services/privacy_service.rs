use crate::models::Privacy;

/// Which privacy tiers a query may return, derived from the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityScope {
    Anonymous,
    Authenticated { viewer_id: String },
}

impl VisibilityScope {
    pub fn for_viewer(viewer_id: Option<&str>) -> Self {
        match viewer_id {
            Some(id) => VisibilityScope::Authenticated {
                viewer_id: id.to_string(),
            },
            None => VisibilityScope::Anonymous,
        }
    }

    pub fn viewer_id(&self) -> Option<&str> {
        match self {
            VisibilityScope::Anonymous => None,
            VisibilityScope::Authenticated { viewer_id } => Some(viewer_id),
        }
    }

    /// Same rule as [`is_visible`], applied to a concrete owner.
    pub fn allows(&self, privacy: Privacy, owner_user_id: &str) -> bool {
        let viewer = self.viewer_id();
        is_visible(privacy, viewer.is_some(), viewer == Some(owner_user_id))
    }
}

/// PUBLIC and UNLISTED are open to everyone, HIDDEN needs any signed-in
/// viewer, PRIVATE only its signed-in owner.
pub fn is_visible(privacy: Privacy, viewer_is_authenticated: bool, viewer_is_owner: bool) -> bool {
    match privacy {
        Privacy::Public | Privacy::Unlisted => true,
        Privacy::Hidden => viewer_is_authenticated,
        Privacy::Private => viewer_is_authenticated && viewer_is_owner,
    }
}
