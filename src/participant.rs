use crate::error::ValidationError;
use crate::id;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

/// Academic year of a student: bachelor, master and doctoral years.
/// Declared in the order members are listed.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grade {
    B3,
    B4,
    M1,
    M2,
    D1,
    D2,
    D3,
}

impl Grade {
    pub const ALL: [Grade; 7] = [
        Grade::B3,
        Grade::B4,
        Grade::M1,
        Grade::M2,
        Grade::D1,
        Grade::D2,
        Grade::D3,
    ];
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl std::str::FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Grade::ALL
            .iter()
            .copied()
            .find(|g| g.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown grade `{}`", s))
    }
}

/// A registered member of the group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub grade: Option<Grade>,
}

impl User {
    /// Registers a new member with a fresh id.
    ///
    /// The name is trimmed. Students must declare a grade; a grade given for
    /// a teacher is dropped, the way the registration form hides it.
    ///
    /// # Examples
    /// ```
    /// use chousei_libs::participant::{Grade, Role, User};
    ///
    /// let teacher = User::register("  Sato ", Role::Teacher, Some(Grade::M1)).unwrap();
    /// assert_eq!(teacher.name, "Sato");
    /// assert_eq!(teacher.grade, None);
    ///
    /// assert!(User::register("Ito", Role::Student, None).is_err());
    /// ```
    pub fn register(name: &str, role: Role, grade: Option<Grade>) -> Result<User, ValidationError> {
        let (name, grade) = checked_profile(name, role, grade)?;
        let user = User {
            id: id::next_id(),
            name,
            role,
            grade,
        };

        info!("Registered {} `{}` ({})", user.role, user.name, user.id);
        Ok(user)
    }

    /// A copy of this user with a new profile. The id is preserved.
    /// Past responses keep whatever the user declared when answering.
    pub fn edit_profile(&self, name: &str, role: Role, grade: Option<Grade>) -> Result<User, ValidationError> {
        let (name, grade) = checked_profile(name, role, grade)?;

        Ok(User {
            id: self.id.clone(),
            name,
            role,
            grade,
        })
    }

    /// Builds a user from stored fields, enforcing the grade/role rule
    /// strictly instead of dropping a teacher's grade.
    pub fn with_id(id: &str, name: &str, role: Role, grade: Option<Grade>) -> Result<User, ValidationError> {
        if role == Role::Teacher && grade.is_some() {
            return Err(ValidationError::UnexpectedGrade);
        }
        let (name, grade) = checked_profile(name, role, grade)?;

        Ok(User {
            id: id.to_string(),
            name,
            role,
            grade,
        })
    }

    /// What this user declares about themselves at answer time.
    pub fn responder(&self) -> Responder {
        Responder {
            user_name: self.name.clone(),
            user_role: self.role,
            user_grade: self.grade,
        }
    }
}

fn checked_profile(
    name: &str,
    role: Role,
    grade: Option<Grade>,
) -> Result<(String, Option<Grade>), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }

    let grade = match role {
        Role::Teacher => None,
        Role::Student => Some(grade.ok_or(ValidationError::MissingGrade)?),
    };

    Ok((name.to_string(), grade))
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Teacher => write!(f, "teacher"),
            Role::Student => write!(f, "student"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(format!("unknown role `{}`", other)),
        }
    }
}

/// Identity frozen into a response when it is submitted.
/// Later profile edits do not reach it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Responder {
    pub user_name: String,
    pub user_role: Role,
    pub user_grade: Option<Grade>,
}

/// Members grouped for the member list: teachers first, then every grade.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Roster<'a> {
    pub teachers: Vec<&'a User>,
    pub students: BTreeMap<Grade, Vec<&'a User>>,
}

impl<'a> Roster<'a> {
    pub fn from_users(users: &'a [User]) -> Roster<'a> {
        let mut students: BTreeMap<Grade, Vec<&User>> =
            Grade::ALL.iter().map(|&grade| (grade, Vec::new())).collect();

        let mut teachers = Vec::new();
        for user in users {
            match (user.role, user.grade) {
                (Role::Teacher, _) => teachers.push(user),
                (Role::Student, Some(grade)) => students.entry(grade).or_default().push(user),
                (Role::Student, None) => {}
            }
        }

        Roster { teachers, students }
    }
}
