//! Archive database schema.

/// SQL to create the archive tables.
pub const CREATE_ARCHIVE_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS players (
    id              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    ext_uuid        UUID NOT NULL UNIQUE,
    name            VARCHAR(255) NOT NULL,
    last_seen       TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    total_games     INTEGER NOT NULL DEFAULT 0,
    total_wins      INTEGER NOT NULL DEFAULT 0,
    total_points    INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS games (
    id              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    session_ext_id  VARCHAR(255) NOT NULL,
    question_count  INTEGER NOT NULL,
    status          VARCHAR(32) NOT NULL DEFAULT 'in_progress',
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    completed_at    TIMESTAMPTZ,
    winner_id       UUID REFERENCES players (id),
    total_players   INTEGER NOT NULL DEFAULT 0,
    questions_asked INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS game_participants (
    game_id             UUID NOT NULL REFERENCES games (id),
    player_id           UUID NOT NULL REFERENCES players (id),
    total_points        INTEGER,
    questions_answered  INTEGER,
    final_rank          INTEGER,
    PRIMARY KEY (game_id, player_id)
);

CREATE TABLE IF NOT EXISTS question_results (
    id              BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    game_id         UUID NOT NULL REFERENCES games (id),
    player_id       UUID NOT NULL REFERENCES players (id),
    question_number INTEGER NOT NULL,
    question_id     INTEGER NOT NULL,
    answer_index    INTEGER NOT NULL,
    is_correct      BOOLEAN NOT NULL,
    response_time   DOUBLE PRECISION NOT NULL,
    points_earned   INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_games_created_at
    ON games (created_at DESC);

CREATE INDEX IF NOT EXISTS idx_question_results_game_id
    ON question_results (game_id);
";
