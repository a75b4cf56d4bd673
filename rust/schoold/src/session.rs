use serde::{Deserialize, Serialize};

/// Viewer role used for notice audience filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Public,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "teacher" => Some(Self::Teacher),
            "student" => Some(Self::Student),
            "public" => Some(Self::Public),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Teacher => "Teacher",
            Self::Student => "Student",
            Self::Public => "Public",
        }
    }
}

/// Presence flags handed over by the shell's auth layer (one per session cookie).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMarkers {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub teacher: bool,
    #[serde(default)]
    pub student: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    markers: SessionMarkers,
    role: Role,
}

impl Session {
    /// Resolves the role with precedence Admin > Teacher > Student > Public.
    /// Conflicting markers never fail.
    pub fn from_markers(markers: SessionMarkers) -> Self {
        let role = if markers.admin {
            Role::Admin
        } else if markers.teacher {
            Role::Teacher
        } else if markers.student {
            Role::Student
        } else {
            Role::Public
        };
        Self { markers, role }
    }

    pub fn public() -> Self {
        Self::from_markers(SessionMarkers::default())
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn markers(&self) -> SessionMarkers {
        self.markers
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::public()
    }
}
