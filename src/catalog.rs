//! Department-keyed reference tables used by the insight generator.
//!
//! Lookups fall back to [`DEFAULT_DEPARTMENT`] for unknown departments, and to
//! a single generic entry if even that table is empty.

pub const DEFAULT_DEPARTMENT: &str = "CSE";

pub const GENERIC_ROLE: &str = "Software Engineer";
pub const GENERIC_SUBJECT: &str = "Engineering Mathematics";

pub const CAREER_ICONS: &[&str] = &["🚀", "📊", "🧠", "🔧", "⚡", "🏗️"];

const CAREER_ROLES: &[(&str, &[&str])] = &[
    (
        "CSE",
        &[
            "Software Architect",
            "Data Scientist",
            "Full Stack Developer",
            "AI Engineer",
            "Cybersecurity Analyst",
        ],
    ),
    (
        "ECE",
        &[
            "Embedded Systems Engineer",
            "VLSI Design Engineer",
            "IoT Specialist",
            "Network Engineer",
        ],
    ),
    (
        "MECH",
        &[
            "Robotics Engineer",
            "Automotive Designer",
            "Supply Chain Analyst",
            "Thermal Engineer",
        ],
    ),
    (
        "EEE",
        &[
            "Power Systems Engineer",
            "Control Systems Lead",
            "Renewable Energy Consultant",
        ],
    ),
    (
        "CIVIL",
        &[
            "Structural Engineer",
            "Urban Planner",
            "Construction Manager",
        ],
    ),
];

const SUBJECTS: &[(&str, &[&str])] = &[
    (
        "CSE",
        &[
            "Data Structures",
            "Algorithms",
            "OS",
            "DBMS",
            "Networks",
            "AI",
            "Compiler Design",
        ],
    ),
    (
        "ECE",
        &[
            "Circuits",
            "Digital Electronics",
            "Signals & Systems",
            "Microprocessors",
            "Communication",
        ],
    ),
    (
        "MECH",
        &[
            "Thermodynamics",
            "Fluid Mechanics",
            "Kinematics",
            "Manufacturing",
            "CAD/CAM",
        ],
    ),
    (
        "EEE",
        &[
            "Circuit Theory",
            "Machines",
            "Power Systems",
            "Control Systems",
            "Analog Electronics",
        ],
    ),
    (
        "CIVIL",
        &[
            "Mechanics",
            "Structures",
            "Surveying",
            "Geotech",
            "Hydraulics",
        ],
    ),
];

const REQUIRED_SKILLS: &[(&str, &[&str])] = &[
    (
        "CSE",
        &["Python", "Data Structures", "SQL", "Git", "System Design"],
    ),
    (
        "ECE",
        &["Embedded C", "VLSI", "Signal Processing", "IoT"],
    ),
    (
        "MECH",
        &["CAD/CAM", "Thermodynamics", "Robotics", "Manufacturing"],
    ),
    (
        "EEE",
        &["Power Systems", "Control Systems", "MATLAB", "Electrical Machines"],
    ),
    (
        "CIVIL",
        &["AutoCAD", "Structural Analysis", "Surveying", "Project Management"],
    ),
];

/// Table selected for a department, reporting whether a fallback was used.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub entries: Vec<&'static str>,
    pub fallback: bool,
}

pub fn career_roles(department: Option<&str>) -> Lookup {
    lookup(CAREER_ROLES, department, GENERIC_ROLE)
}

pub fn subjects(department: Option<&str>) -> Lookup {
    lookup(SUBJECTS, department, GENERIC_SUBJECT)
}

/// Required skills have no generic entry; an empty set means "no gap".
pub fn required_skills(department: Option<&str>) -> Vec<&'static str> {
    let mut found = lookup(REQUIRED_SKILLS, department, "");
    found.entries.retain(|skill| !skill.is_empty());
    found.entries
}

fn lookup(
    table: &[(&str, &'static [&'static str])],
    department: Option<&str>,
    generic: &'static str,
) -> Lookup {
    let find = |key: &str| {
        table
            .iter()
            .find(|(dept, _)| dept.eq_ignore_ascii_case(key))
            .map(|(_, entries)| *entries)
    };

    let direct = department.map(str::trim).and_then(find);
    let fallback = direct.is_none();
    let entries = direct
        .or_else(|| find(DEFAULT_DEPARTMENT))
        .filter(|entries| !entries.is_empty())
        .map(|entries| entries.to_vec())
        .unwrap_or_else(|| vec![generic]);

    Lookup { entries, fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_department_is_direct() {
        let roles = career_roles(Some("ece"));
        assert!(!roles.fallback);
        assert_eq!(roles.entries.len(), 4);
        assert_eq!(roles.entries[0], "Embedded Systems Engineer");
    }

    #[test]
    fn unknown_department_falls_back_to_default() {
        let subjects = subjects(Some("BIOTECH"));
        assert!(subjects.fallback);
        assert_eq!(subjects.entries[0], "Data Structures");

        let missing = career_roles(None);
        assert!(missing.fallback);
        assert_eq!(missing.entries.len(), 5);
    }

    #[test]
    fn empty_table_falls_back_to_generic() {
        let lookup = lookup(&[], Some("CSE"), GENERIC_ROLE);
        assert!(lookup.fallback);
        assert_eq!(lookup.entries, vec![GENERIC_ROLE]);
    }

    #[test]
    fn required_skills_for_default() {
        assert_eq!(required_skills(Some("AIML")).len(), 5);
        assert!(required_skills(Some("CIVIL")).contains(&"AutoCAD"));
    }
}
