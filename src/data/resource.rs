use super::schema::Schema;

/// Top-level resource families stored as free-form documents.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Resource {
    Cohorts,
    Days,
    Assignments,
    CourseMaterial,
    SkillsTree,
    Branches,
}

const fn free_form(collection: &'static str) -> Schema {
    Schema {
        collection,
        discriminator_key: None,
        base: &[],
        variants: &[],
        strict: false,
    }
}

static COHORT_SCHEMA: Schema = free_form("cohorts");
static DAY_SCHEMA: Schema = free_form("days");
static ASSIGNMENT_SCHEMA: Schema = free_form("assignments");
static COURSE_MATERIAL_SCHEMA: Schema = free_form("coursematerials");
static SKILLS_TREE_SCHEMA: Schema = free_form("skilltrees");
static BRANCH_SCHEMA: Schema = free_form("branches");

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::Cohorts,
        Resource::Days,
        Resource::Assignments,
        Resource::CourseMaterial,
        Resource::SkillsTree,
        Resource::Branches,
    ];

    /// Path segment the family is mounted under.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Cohorts => "cohorts",
            Resource::Days => "days",
            Resource::Assignments => "assignments",
            Resource::CourseMaterial => "course-material",
            Resource::SkillsTree => "skills-tree",
            Resource::Branches => "branches",
        }
    }

    pub fn from_path(segment: &str) -> Option<Resource> {
        Resource::ALL.into_iter().find(|r| r.path() == segment)
    }

    pub fn schema(self) -> &'static Schema {
        match self {
            Resource::Cohorts => &COHORT_SCHEMA,
            Resource::Days => &DAY_SCHEMA,
            Resource::Assignments => &ASSIGNMENT_SCHEMA,
            Resource::CourseMaterial => &COURSE_MATERIAL_SCHEMA,
            Resource::SkillsTree => &SKILLS_TREE_SCHEMA,
            Resource::Branches => &BRANCH_SCHEMA,
        }
    }

    /// Name used in not-found messages.
    pub fn noun(self) -> &'static str {
        match self {
            Resource::Cohorts => "Cohort",
            Resource::Days => "Day",
            Resource::Assignments => "Assignment",
            Resource::CourseMaterial => "Course material",
            Resource::SkillsTree => "Skills tree",
            Resource::Branches => "Branch",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_round_trip() {
        for r in Resource::ALL {
            assert_eq!(Resource::from_path(r.path()), Some(r));
        }
        assert_eq!(Resource::from_path("questions"), None);
    }

    #[test]
    fn collections_are_distinct() {
        let mut names: Vec<_> = Resource::ALL.iter().map(|r| r.schema().collection).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Resource::ALL.len());
    }
}
