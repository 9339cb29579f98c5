//! The entity tables of the school-management schema.
//!
//! Grouped by domain, not by creation order; the bootstrap sorts them by
//! their declared parents. `parents` must list exactly the tables named in
//! the DDL's `REFERENCES` clauses (checked by the store tests).

use campus_core::table::TableSpec;

use crate::schema::*;

pub const ENTITIES: &[TableSpec] = &[
  // people
  TableSpec {
    name:    "users",
    parents: &["users"],
    ddl:     &[USERS, USERS_ROLE_IDX],
    seed:    None,
  },
  TableSpec {
    name:    "user_settings",
    parents: &["users"],
    ddl:     &[USER_SETTINGS],
    seed:    None,
  },
  // courses and classes
  TableSpec {
    name:    "course_enrollments",
    parents: &["courses", "users"],
    ddl:     &[COURSE_ENROLLMENTS, COURSE_ENROLLMENTS_STUDENT_IDX],
    seed:    None,
  },
  TableSpec {
    name:    "courses",
    parents: &["users"],
    ddl:     &[COURSES, COURSES_TEACHER_IDX],
    seed:    None,
  },
  TableSpec {
    name:    "classes",
    parents: &["courses", "users"],
    ddl:     &[CLASSES],
    seed:    None,
  },
  TableSpec {
    name:    "class_schedules",
    parents: &["classes"],
    ddl:     &[CLASS_SCHEDULES, CLASS_SCHEDULES_CLASS_IDX],
    seed:    None,
  },
  TableSpec {
    name:    "attendance",
    parents: &["classes", "users"],
    ddl:     &[ATTENDANCE, ATTENDANCE_STUDENT_IDX],
    seed:    None,
  },
  // documents and coursework
  TableSpec {
    name:    "submissions",
    parents: &["users", "courses", "documents"],
    ddl:     &[SUBMISSIONS, SUBMISSIONS_COURSE_IDX],
    seed:    None,
  },
  TableSpec {
    name:    "documents",
    parents: &["users", "courses"],
    ddl:     &[DOCUMENTS],
    seed:    None,
  },
  TableSpec {
    name:    "materials",
    parents: &["courses", "users"],
    ddl:     &[MATERIALS],
    seed:    None,
  },
  TableSpec {
    name:    "material_progress",
    parents: &["materials", "users"],
    ddl:     &[MATERIAL_PROGRESS],
    seed:    None,
  },
  TableSpec {
    name:    "feedback",
    parents: &["users", "courses"],
    ddl:     &[FEEDBACK],
    seed:    None,
  },
  TableSpec {
    name:    "certificates",
    parents: &["users", "courses"],
    ddl:     &[CERTIFICATES],
    seed:    None,
  },
  // payments
  TableSpec {
    name:    "invoices",
    parents: &["payments", "users"],
    ddl:     &[INVOICES],
    seed:    None,
  },
  TableSpec {
    name:    "payments",
    parents: &["users"],
    ddl:     &[PAYMENTS, PAYMENTS_USER_IDX],
    seed:    None,
  },
  TableSpec {
    name:    "payment_methods",
    parents: &["users"],
    ddl:     &[PAYMENT_METHODS],
    seed:    None,
  },
  // singleton settings
  TableSpec {
    name:    "system_settings",
    parents: &[],
    ddl:     &[SYSTEM_SETTINGS],
    seed:    Some(SYSTEM_SETTINGS_SEED),
  },
  TableSpec {
    name:    "security_settings",
    parents: &[],
    ddl:     &[SECURITY_SETTINGS],
    seed:    Some(SECURITY_SETTINGS_SEED),
  },
];

/// Look up a catalog entry by table name.
#[cfg(test)]
pub(crate) fn entity(name: &str) -> Option<&'static TableSpec> {
  ENTITIES.iter().find(|spec| spec.name == name)
}
