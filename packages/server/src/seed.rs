use chrono::Utc;
use sea_orm::sea_query::{Index, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;
use uuid::Uuid;

use crate::entity::{announcement, category, challenge, difficulty, session, submission};

/// Default categories seeded at install: (name, slug, color, icon).
const DEFAULT_CATEGORIES: &[(&str, &str, &str, &str)] = &[
    ("Web Exploitation", "web", "#3b82f6", "globe"),
    ("Cryptography", "crypto", "#a855f7", "key"),
    ("Forensics", "forensics", "#f59e0b", "search"),
    ("Binary Exploitation", "binary", "#ef4444", "cpu"),
    ("Reverse Engineering", "reverse", "#22c55e", "rotate-ccw"),
];

/// Default difficulty tiers: (name, slug, color, level).
const DEFAULT_DIFFICULTIES: &[(&str, &str, &str, i32)] = &[
    ("Easy", "easy", "#22c55e", 1),
    ("Medium", "medium", "#f59e0b", 2),
    ("Hard", "hard", "#ef4444", 3),
];

/// Demo challenges: (title, description, category slug, difficulty slug, points, flag).
const DEMO_CHALLENGES: &[(&str, &str, &str, &str, i32, &str)] = &[
    (
        "SQL Injection Basics",
        "Find the hidden flag in this vulnerable login page. The application doesn't properly sanitize user input. Try using common SQL injection techniques to bypass authentication.\n\nHint: Think about how you can manipulate the SQL query.",
        "web",
        "easy",
        100,
        "flag{sql_1nj3ct10n_1s_d4ng3r0us}",
    ),
    (
        "Caesar's Secret",
        "An ancient encryption method was used to hide this message:\n\nGSVH R ORPV XIBKGLTIZKSR\n\nThe key is somewhere between 1 and 25. Can you decode it?",
        "crypto",
        "easy",
        150,
        "flag{i_like_cryptography}",
    ),
    (
        "Hidden in Plain Sight",
        "We intercepted this image file. Our analysts believe there's hidden data embedded within it. Can you extract the secret?\n\nTools you might need: exiftool, strings, binwalk",
        "forensics",
        "medium",
        250,
        "flag{st3g4n0gr4phy_m4st3r}",
    ),
    (
        "XSS Playground",
        "This web application reflects user input without proper sanitization. Craft an XSS payload that will execute JavaScript and reveal the flag stored in a cookie.\n\nCookie name: secret_flag",
        "web",
        "medium",
        200,
        "flag{xss_c4n_b3_d4ng3r0us}",
    ),
    (
        "Buffer Overflow 101",
        "This program has a classic buffer overflow vulnerability. Exploit it to gain control of the execution flow and retrieve the flag.\n\n```c\nvoid secret() {\n    printf(\"...\");\n}\n\nint main() {\n    char buffer[64];\n    gets(buffer);\n    return 0;\n}\n```",
        "binary",
        "hard",
        400,
        "flag{buff3r_0v3rfl0w_pwn3d}",
    ),
    (
        "Reverse Engineering Challenge",
        "This program checks if your input is correct and reveals the flag. Can you reverse engineer the algorithm?\n\nHint: The flag is XORed with a key",
        "reverse",
        "hard",
        400,
        "flag{r3v3rs3_m3_1f_y0u_c4n}",
    ),
];

/// Demo announcements: (title, message, type).
const DEMO_ANNOUNCEMENTS: &[(&str, &str, &str)] = &[
    (
        "Welcome to CTF Platform!",
        "Thank you for joining our CTF competition. Read the rules carefully and have fun hacking!",
        "info",
    ),
    (
        "Competition Rules",
        "1. No DDoS attacks\n2. No sharing flags\n3. No automated tools without permission\n4. Report bugs responsibly",
        "warning",
    ),
];

/// Seed default categories and difficulties, keyed by slug so reseeding is
/// a no-op for rows that already exist.
pub async fn seed_reference_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut inserted = 0u32;

    for &(name, slug, color, icon) in DEFAULT_CATEGORIES {
        let model = category::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            description: Set(None),
            color: Set(Some(color.to_string())),
            icon: Set(Some(icon.to_string())),
            sort_order: Set(inserted as i32),
        };

        let result = category::Entity::insert(model)
            .on_conflict(
                OnConflict::column(category::Column::Slug)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    for (position, &(name, slug, color, level)) in DEFAULT_DIFFICULTIES.iter().enumerate() {
        let model = difficulty::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            description: Set(None),
            color: Set(Some(color.to_string())),
            level: Set(level),
            sort_order: Set(position as i32),
        };

        let result = difficulty::Entity::insert(model)
            .on_conflict(
                OnConflict::column(difficulty::Column::Slug)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} reference rows", inserted);
    }
    Ok(())
}

/// Seed the demo content set: reference data plus sample challenges and
/// announcements. Challenges and announcements are only written into an
/// empty table; they have no natural key to dedupe on.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    seed_reference_data(db).await?;

    if challenge::Entity::find().count(db).await? == 0 {
        for &(title, description, category_slug, difficulty_slug, points, flag) in DEMO_CHALLENGES
        {
            let Some(category_model) = category::Entity::find()
                .filter(category::Column::Slug.eq(category_slug))
                .one(db)
                .await?
            else {
                continue;
            };
            let Some(difficulty_model) = difficulty::Entity::find()
                .filter(difficulty::Column::Slug.eq(difficulty_slug))
                .one(db)
                .await?
            else {
                continue;
            };

            challenge::ActiveModel {
                id: Set(Uuid::new_v4().to_string()),
                title: Set(title.to_string()),
                description: Set(description.to_string()),
                category_id: Set(category_model.id),
                difficulty_id: Set(difficulty_model.id),
                points: Set(points),
                flag: Set(flag.to_string()),
            }
            .insert(db)
            .await?;
        }
        info!("Seeded {} demo challenges", DEMO_CHALLENGES.len());
    }

    if announcement::Entity::find().count(db).await? == 0 {
        for &(title, message, kind) in DEMO_ANNOUNCEMENTS {
            announcement::ActiveModel {
                id: Set(Uuid::new_v4().to_string()),
                title: Set(title.to_string()),
                message: Set(message.to_string()),
                kind: Set(kind.to_string()),
                is_active: Set(1),
                created_by: Set("system".to_string()),
                created_at: Set(Utc::now()),
            }
            .insert(db)
            .await?;
        }
        info!("Seeded {} demo announcements", DEMO_ANNOUNCEMENTS.len());
    }

    Ok(())
}

/// Create the secondary indexes schema sync does not cover.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let statements = [
        Index::create()
            .if_not_exists()
            .name("idx_sessions_expires_at")
            .table(session::Entity)
            .col(session::Column::ExpiresAt)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_submissions_player_challenge")
            .table(submission::Entity)
            .col(submission::Column::PlayerId)
            .col(submission::Column::ChallengeId)
            .to_owned(),
    ];

    for stmt in statements {
        let sql = stmt.to_string(PostgresQueryBuilder);
        db.execute_raw(Statement::from_string(DbBackend::Postgres, sql))
            .await?;
    }

    Ok(())
}
