//! Tables for people, authorship records, actions and appointments.

/// Run on every open. Safe to repeat against an existing database.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS counselors (
    counselor_id TEXT PRIMARY KEY,
    first_name   TEXT NOT NULL,
    last_name    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS persons (
    person_id             TEXT PRIMARY KEY,
    first_name            TEXT NOT NULL,
    last_name             TEXT NOT NULL,
    created_at            TEXT NOT NULL,
    push_token            TEXT,
    push_token_updated_at TEXT,
    counselor_id          TEXT NOT NULL REFERENCES counselors(counselor_id)
);

-- One row per distinct author; never deleted.
CREATE TABLE IF NOT EXISTS actors (
    actor_id     TEXT PRIMARY KEY,
    creator_id   TEXT NOT NULL,
    creator_kind TEXT NOT NULL,    -- 'person' | 'counselor'
    UNIQUE (creator_id, creator_kind)
);

-- Actions are never deleted. Completion lives in `status` only.
CREATE TABLE IF NOT EXISTS actions (
    action_id            TEXT PRIMARY KEY,
    person_id            TEXT NOT NULL REFERENCES persons(person_id),
    content              TEXT NOT NULL,
    comment              TEXT,
    status               TEXT NOT NULL DEFAULT 'not_started',
    visible_to_counselor INTEGER NOT NULL DEFAULT 1,
    created_at           TEXT NOT NULL,
    limit_date           TEXT,
    last_update          TEXT NOT NULL,
    completed_at         TEXT,
    actor_id             TEXT NOT NULL REFERENCES actors(actor_id),
    CHECK (status IN ('not_started', 'in_progress', 'done'))
);

-- Appointments are soft-deleted only.
CREATE TABLE IF NOT EXISTS appointments (
    appointment_id   TEXT PRIMARY KEY,
    title            TEXT NOT NULL,
    subtitle         TEXT NOT NULL,
    comment          TEXT,
    modality         TEXT NOT NULL,
    date             TEXT NOT NULL,   -- fixed-width RFC 3339 UTC, sortable
    duration_seconds INTEGER NOT NULL,
    soft_deleted     INTEGER NOT NULL DEFAULT 0,
    person_id        TEXT NOT NULL REFERENCES persons(person_id),
    counselor_id     TEXT NOT NULL REFERENCES counselors(counselor_id)
);

CREATE INDEX IF NOT EXISTS persons_counselor_idx     ON persons(counselor_id);
CREATE INDEX IF NOT EXISTS actions_person_idx        ON actions(person_id);
CREATE INDEX IF NOT EXISTS appointments_person_idx   ON appointments(person_id, date);
CREATE INDEX IF NOT EXISTS appointments_counselor_idx ON appointments(counselor_id, date);

PRAGMA user_version = 1;
";
