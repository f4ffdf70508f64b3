use crate::models::report::ReportKind;
use crate::models::role::{action, feature};
use crate::session::Authenticated;

pub struct NavLink {
    pub href: String,
    pub label: &'static str,
    pub active: bool,
}

/// Header and navigation shared by every signed-in page.
pub struct PageChrome {
    pub user_name: String,
    pub initials: String,
    pub role_label: String,
    pub nav: Vec<NavLink>,
}

impl PageChrome {
    /// Only links the role may open are listed.
    pub fn new(auth: &Authenticated, current_path: &str) -> Self {
        let mut entries: Vec<(String, &'static str, &'static str)> =
            vec![("/dashboard".to_string(), "Dashboard", feature::DASHBOARD)];
        entries.extend(
            ReportKind::ALL
                .iter()
                .map(|kind| (format!("/reports/{}", kind.slug()), kind.title(), kind.feature())),
        );
        entries.push((
            "/admin/permissions".to_string(),
            "Permissions",
            feature::PERMISSIONS,
        ));

        let nav = entries
            .into_iter()
            .filter(|(_, _, gate)| auth.can(gate, action::VIEW))
            .map(|(href, label, _)| NavLink {
                active: href == current_path,
                href,
                label,
            })
            .collect();

        Self {
            user_name: auth.user.display_name(),
            initials: auth.user.initials(),
            role_label: auth.role.role.to_string(),
            nav,
        }
    }
}
