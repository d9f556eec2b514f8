/// Represents ways to locate a UI element
///
/// Chains are resolved step by step: every step picks among the direct
/// children of the element matched by the previous step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Select by role and optional name
    Role { role: String, name: Option<String> },
    /// Select by name/label, whatever the role
    Name(String),
    /// Select the n-th element among the matches of the preceding role (0-based, negative counts from the end)
    Nth(i32),
    /// Chain multiple selectors
    Chain(Vec<Selector>),
    /// Represents an invalid selector string, with a reason.
    Invalid(String),
}

impl Selector {
    /// Selector for a running application (its process) by name.
    pub fn application(name: impl Into<String>) -> Self {
        Selector::Role {
            role: "application".to_string(),
            name: Some(name.into()),
        }
    }

    /// Flatten nested chains into a single list of steps.
    pub fn steps(&self) -> Vec<&Selector> {
        match self {
            Selector::Chain(parts) => parts.iter().flat_map(|p| p.steps()).collect(),
            s => vec![s],
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::Role { role, name: Some(name) } => write!(f, "{role}|{name}"),
            Selector::Role { role, name: None } => write!(f, "role:{role}"),
            Selector::Name(name) => write!(f, "name:{name}"),
            Selector::Nth(index) => write!(f, "nth:{index}"),
            Selector::Chain(parts) => {
                let parts: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
                write!(f, "{}", parts.join(" >> "))
            }
            Selector::Invalid(reason) => write!(f, "invalid({reason})"),
        }
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        // Handle chained selectors first
        let parts: Vec<&str> = s.split(">>").map(|p| p.trim()).collect();
        if parts.len() > 1 {
            return Selector::Chain(parts.into_iter().map(Selector::from).collect());
        }
        let s = s.trim();

        // role|name is the precise format
        if let Some((role_part, name_part)) = s.split_once('|') {
            let role = role_part.trim();
            let role = role.strip_prefix("role:").unwrap_or(role).trim();
            let name = name_part.trim();
            let name = name.strip_prefix("name:").unwrap_or(name).trim();
            if role.is_empty() || name.is_empty() {
                return Selector::Invalid(format!("Empty role or name in \"{s}\""));
            }
            return Selector::Role {
                role: role.to_string(),
                name: Some(name.to_string()),
            };
        }

        let lower = s.to_lowercase();
        match s {
            "" => Selector::Invalid("Empty selector".to_string()),
            _ if lower.starts_with("role:") => Selector::Role {
                role: s[5..].trim().to_string(),
                name: None,
            },
            // Common roles default to role selectors
            "app" | "application" | "window" | "button" | "checkbox" | "menu" | "menuitem"
            | "menubar" | "textfield" | "input" => Selector::Role {
                role: s.to_string(),
                name: None,
            },
            _ if s.starts_with("AX") => Selector::Role {
                role: s.to_string(),
                name: None,
            },
            _ if lower.starts_with("name:") => Selector::Name(s[5..].trim().to_string()),
            _ if lower.starts_with("nth:") || lower.starts_with("nth=") => {
                let index_str = s[4..].trim();
                match index_str.parse::<i32>() {
                    Ok(index) => Selector::Nth(index),
                    Err(_) => {
                        Selector::Invalid(format!("Invalid index for nth selector: '{index_str}'"))
                    }
                }
            }
            _ if s.contains(':') => {
                let (role, name) = s.split_once(':').unwrap_or((s, ""));
                Selector::Role {
                    role: role.trim().to_string(),
                    name: Some(name.trim().to_string()),
                }
            }
            _ => Selector::Invalid(format!(
                "Unknown selector format: \"{s}\". Use 'role:', 'name:', 'nth:' prefixes or 'role|name'."
            )),
        }
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Selector::from(s.as_str())
    }
}
