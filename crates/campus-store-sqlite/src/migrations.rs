//! The declared migration sequence, applied in order by the runner.
//!
//! Each migration reuses the catalog DDL, so a table created by a migration,
//! by the fallback script or by its initialiser is the same table. Order
//! matters: a migration runs only once the parents of every table it
//! `creates` exist.

use campus_core::migration::Migration;

use crate::schema::*;

pub const MIGRATIONS: &[Migration] = &[
  Migration {
    name:       "create_users_table",
    creates:    &["users"],
    statements: &[USERS, USERS_ROLE_IDX],
  },
  Migration {
    name:       "create_courses_table",
    creates:    &["courses"],
    statements: &[COURSES, COURSES_TEACHER_IDX],
  },
  Migration {
    name:       "create_enrollments_table",
    creates:    &["course_enrollments"],
    statements: &[COURSE_ENROLLMENTS, COURSE_ENROLLMENTS_STUDENT_IDX],
  },
  Migration {
    name:       "create_classes_table",
    creates:    &["classes", "class_schedules"],
    statements: &[CLASSES, CLASS_SCHEDULES, CLASS_SCHEDULES_CLASS_IDX],
  },
  Migration {
    name:       "create_attendance_table",
    creates:    &["attendance"],
    statements: &[ATTENDANCE, ATTENDANCE_STUDENT_IDX],
  },
  Migration {
    name:       "create_documents_table",
    creates:    &["documents", "submissions"],
    statements: &[DOCUMENTS, SUBMISSIONS, SUBMISSIONS_COURSE_IDX],
  },
  Migration {
    name:       "create_payments_table",
    creates:    &["payments", "payment_methods", "invoices"],
    statements: &[PAYMENTS, PAYMENTS_USER_IDX, PAYMENT_METHODS, INVOICES],
  },
  Migration {
    name:       "create_materials_table",
    creates:    &["materials", "material_progress"],
    statements: &[MATERIALS, MATERIAL_PROGRESS],
  },
  Migration {
    name:       "create_feedback_table",
    creates:    &["feedback"],
    statements: &[FEEDBACK],
  },
  Migration {
    name:       "create_certificates_table",
    creates:    &["certificates"],
    statements: &[CERTIFICATES],
  },
  Migration {
    name:       "create_settings_tables",
    creates:    &["user_settings", "system_settings", "security_settings"],
    statements: &[
      USER_SETTINGS,
      SYSTEM_SETTINGS,
      SYSTEM_SETTINGS_SEED,
      SECURITY_SETTINGS,
      SECURITY_SETTINGS_SEED,
    ],
  },
];
