//! SQL for the Campus SQLite store.
//!
//! Every statement is idempotent (`IF NOT EXISTS` or insert-if-absent) so
//! that migrations, the fallback schema script and the direct initialisers
//! can all run against a database that is already partly or fully built.

/// Executed on every new connection.
pub const CONNECTION_PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

// ─── Ledger ──────────────────────────────────────────────────────────────────

pub const MIGRATIONS_LEDGER: &str = "
CREATE TABLE IF NOT EXISTS migrations (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT    NOT NULL UNIQUE,
    success       INTEGER NOT NULL,
    executed_at   TEXT    NOT NULL,   -- RFC 3339 UTC
    error_message TEXT
)";

// ─── People ──────────────────────────────────────────────────────────────────

pub const USERS: &str = "
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL CHECK (role IN ('admin', 'teacher', 'student', 'parent')),
    phone         TEXT,
    address       TEXT,
    profile_image TEXT,
    -- a student's guardian
    parent_id     INTEGER REFERENCES users(id) ON DELETE SET NULL,
    status        TEXT NOT NULL DEFAULT 'active',
    created_at    TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at    TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

pub const USERS_ROLE_IDX: &str =
  "CREATE INDEX IF NOT EXISTS users_role_idx ON users(role)";

pub const USER_SETTINGS: &str = "
CREATE TABLE IF NOT EXISTS user_settings (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id             INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    theme               TEXT    NOT NULL DEFAULT 'light',
    language            TEXT    NOT NULL DEFAULT 'en',
    email_notifications INTEGER NOT NULL DEFAULT 1,
    sms_notifications   INTEGER NOT NULL DEFAULT 0,
    updated_at          TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

// ─── Courses and classes ─────────────────────────────────────────────────────

pub const COURSES: &str = "
CREATE TABLE IF NOT EXISTS courses (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    code        TEXT NOT NULL UNIQUE,
    title       TEXT NOT NULL,
    description TEXT,
    teacher_id  INTEGER REFERENCES users(id) ON DELETE SET NULL,
    credits     INTEGER NOT NULL DEFAULT 0,
    fee         REAL    NOT NULL DEFAULT 0,
    status      TEXT    NOT NULL DEFAULT 'active',
    start_date  TEXT,
    end_date    TEXT,
    created_at  TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

pub const COURSES_TEACHER_IDX: &str =
  "CREATE INDEX IF NOT EXISTS courses_teacher_idx ON courses(teacher_id)";

pub const COURSE_ENROLLMENTS: &str = "
CREATE TABLE IF NOT EXISTS course_enrollments (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    course_id   INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
    student_id  INTEGER NOT NULL REFERENCES users(id)   ON DELETE CASCADE,
    status      TEXT    NOT NULL DEFAULT 'active',
    progress    REAL    NOT NULL DEFAULT 0,
    enrolled_at TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (course_id, student_id)
)";

pub const COURSE_ENROLLMENTS_STUDENT_IDX: &str =
  "CREATE INDEX IF NOT EXISTS course_enrollments_student_idx ON course_enrollments(student_id)";

pub const CLASSES: &str = "
CREATE TABLE IF NOT EXISTS classes (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    course_id  INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
    teacher_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    name       TEXT    NOT NULL,
    room       TEXT,
    capacity   INTEGER,
    created_at TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

pub const CLASS_SCHEDULES: &str = "
CREATE TABLE IF NOT EXISTS class_schedules (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    class_id    INTEGER NOT NULL REFERENCES classes(id) ON DELETE CASCADE,
    day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
    start_time  TEXT    NOT NULL,
    end_time    TEXT    NOT NULL,
    CHECK (start_time < end_time)
)";

pub const CLASS_SCHEDULES_CLASS_IDX: &str =
  "CREATE INDEX IF NOT EXISTS class_schedules_class_idx ON class_schedules(class_id)";

pub const ATTENDANCE: &str = "
CREATE TABLE IF NOT EXISTS attendance (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    class_id    INTEGER NOT NULL REFERENCES classes(id) ON DELETE CASCADE,
    student_id  INTEGER NOT NULL REFERENCES users(id)   ON DELETE CASCADE,
    date        TEXT    NOT NULL,
    status      TEXT    NOT NULL CHECK (status IN ('present', 'absent', 'late', 'excused')),
    remarks     TEXT,
    recorded_at TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (class_id, student_id, date)
)";

pub const ATTENDANCE_STUDENT_IDX: &str =
  "CREATE INDEX IF NOT EXISTS attendance_student_idx ON attendance(student_id, date)";

// ─── Documents and coursework ────────────────────────────────────────────────

pub const DOCUMENTS: &str = "
CREATE TABLE IF NOT EXISTS documents (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    title         TEXT    NOT NULL,
    document_type TEXT    NOT NULL DEFAULT 'general',
    file_path     TEXT    NOT NULL,
    file_type     TEXT,
    file_size     INTEGER,
    uploaded_by   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    course_id     INTEGER REFERENCES courses(id) ON DELETE SET NULL,
    created_at    TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

pub const SUBMISSIONS: &str = "
CREATE TABLE IF NOT EXISTS submissions (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id   INTEGER NOT NULL REFERENCES users(id)   ON DELETE CASCADE,
    course_id    INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
    document_id  INTEGER REFERENCES documents(id) ON DELETE SET NULL,
    title        TEXT    NOT NULL,
    content      TEXT,
    status       TEXT    NOT NULL DEFAULT 'submitted',
    grade        REAL,
    feedback     TEXT,
    submitted_at TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP,
    graded_at    TEXT
)";

pub const SUBMISSIONS_COURSE_IDX: &str =
  "CREATE INDEX IF NOT EXISTS submissions_course_idx ON submissions(course_id, student_id)";

pub const MATERIALS: &str = "
CREATE TABLE IF NOT EXISTS materials (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    course_id     INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
    uploaded_by   INTEGER REFERENCES users(id) ON DELETE SET NULL,
    title         TEXT    NOT NULL,
    description   TEXT,
    material_type TEXT    NOT NULL DEFAULT 'document',
    url           TEXT,
    position      INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

pub const MATERIAL_PROGRESS: &str = "
CREATE TABLE IF NOT EXISTS material_progress (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    material_id  INTEGER NOT NULL REFERENCES materials(id) ON DELETE CASCADE,
    student_id   INTEGER NOT NULL REFERENCES users(id)     ON DELETE CASCADE,
    status       TEXT    NOT NULL DEFAULT 'not_started',
    progress     REAL    NOT NULL DEFAULT 0 CHECK (progress BETWEEN 0 AND 100),
    completed_at TEXT,
    UNIQUE (material_id, student_id)
)";

pub const FEEDBACK: &str = "
CREATE TABLE IF NOT EXISTS feedback (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    course_id  INTEGER REFERENCES courses(id) ON DELETE SET NULL,
    category   TEXT    NOT NULL DEFAULT 'general',
    rating     INTEGER CHECK (rating BETWEEN 1 AND 5),
    comment    TEXT,
    status     TEXT    NOT NULL DEFAULT 'open',
    created_at TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

pub const CERTIFICATES: &str = "
CREATE TABLE IF NOT EXISTS certificates (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    certificate_number TEXT    NOT NULL UNIQUE,
    verification_code  TEXT    NOT NULL UNIQUE,
    student_id         INTEGER NOT NULL REFERENCES users(id)   ON DELETE CASCADE,
    course_id          INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
    grade              TEXT,
    file_path          TEXT,
    issued_at          TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

// ─── Payments ────────────────────────────────────────────────────────────────

pub const PAYMENTS: &str = "
CREATE TABLE IF NOT EXISTS payments (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    amount          REAL    NOT NULL CHECK (amount >= 0),
    currency        TEXT    NOT NULL DEFAULT 'USD',
    method          TEXT    NOT NULL,
    status          TEXT    NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'completed', 'failed', 'refunded')),
    transaction_ref TEXT UNIQUE,
    description     TEXT,
    paid_at         TEXT,
    created_at      TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

pub const PAYMENTS_USER_IDX: &str =
  "CREATE INDEX IF NOT EXISTS payments_user_idx ON payments(user_id, status)";

pub const PAYMENT_METHODS: &str = "
CREATE TABLE IF NOT EXISTS payment_methods (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    kind       TEXT    NOT NULL,   -- 'card' | 'bank_account' | 'mobile_money'
    provider   TEXT,
    last_four  TEXT,
    expiry     TEXT,
    is_default INTEGER NOT NULL DEFAULT 0,
    created_at TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

pub const INVOICES: &str = "
CREATE TABLE IF NOT EXISTS invoices (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    invoice_number TEXT    NOT NULL UNIQUE,
    payment_id     INTEGER REFERENCES payments(id) ON DELETE SET NULL,
    user_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    amount         REAL    NOT NULL,
    tax            REAL    NOT NULL DEFAULT 0,
    total          REAL    NOT NULL,
    status         TEXT    NOT NULL DEFAULT 'unpaid',
    due_date       TEXT,
    issued_at      TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

// ─── Singleton settings ──────────────────────────────────────────────────────
//
// `CHECK (id = 1)` makes a second row impossible, so seeding is a plain
// insert-if-absent on the primary key and is safe under concurrent startup.

pub const SYSTEM_SETTINGS: &str = "
CREATE TABLE IF NOT EXISTS system_settings (
    id                 INTEGER PRIMARY KEY CHECK (id = 1),
    school_name        TEXT    NOT NULL,
    school_email       TEXT    NOT NULL,
    school_phone       TEXT    NOT NULL,
    school_address     TEXT    NOT NULL,
    academic_year      TEXT    NOT NULL,
    default_language   TEXT    NOT NULL,
    timezone           TEXT    NOT NULL,
    maintenance_mode   INTEGER NOT NULL,
    allow_registration INTEGER NOT NULL,
    updated_at         TEXT    NOT NULL
)";

/// Must match [`campus_core::settings::SystemSettings::defaults`].
pub const SYSTEM_SETTINGS_SEED: &str = "
INSERT INTO system_settings (
    id, school_name, school_email, school_phone, school_address,
    academic_year, default_language, timezone,
    maintenance_mode, allow_registration, updated_at
) VALUES (
    1, 'School Management System', 'admin@school.local', '', '',
    '2024-2025', 'en', 'UTC',
    0, 1, strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
)
ON CONFLICT (id) DO NOTHING";

pub const SECURITY_SETTINGS: &str = "
CREATE TABLE IF NOT EXISTS security_settings (
    id                       INTEGER PRIMARY KEY CHECK (id = 1),
    password_min_length      INTEGER NOT NULL,
    require_special_chars    INTEGER NOT NULL,
    require_numbers          INTEGER NOT NULL,
    session_timeout_minutes  INTEGER NOT NULL,
    max_login_attempts       INTEGER NOT NULL,
    lockout_duration_minutes INTEGER NOT NULL,
    two_factor_required      INTEGER NOT NULL,
    updated_at               TEXT    NOT NULL
)";

/// Must match [`campus_core::settings::SecuritySettings::defaults`].
pub const SECURITY_SETTINGS_SEED: &str = "
INSERT INTO security_settings (
    id, password_min_length, require_special_chars, require_numbers,
    session_timeout_minutes, max_login_attempts, lockout_duration_minutes,
    two_factor_required, updated_at
) VALUES (
    1, 8, 1, 1,
    30, 5, 15,
    0, strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
)
ON CONFLICT (id) DO NOTHING";
