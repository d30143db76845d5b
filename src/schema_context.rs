//! Schema Context
//!
//! The fixed instruction prefix given to the model: role, table layout,
//! date-filtering rules and worked examples. Dates are always filtered
//! with explicit half-open UTC ranges.

use std::sync::OnceLock;

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
}

const fn col(name: &'static str, description: &'static str) -> ColumnSpec {
    ColumnSpec { name, description }
}

pub const VIDEOS: TableSpec = TableSpec {
    name: "videos",
    columns: &[
        col("id", "TEXT, UUID"),
        col("creator_id", "TEXT, UUID"),
        col("video_created_at", "TIMESTAMPTZ, UTC, момент публикации"),
        col("views_count", "BIGINT, итог"),
        col("likes_count", "BIGINT, итог"),
        col("comments_count", "BIGINT, итог"),
        col("reports_count", "BIGINT, итог"),
    ],
};

pub const VIDEO_SNAPSHOTS: TableSpec = TableSpec {
    name: "video_snapshots",
    columns: &[
        col("id", "TEXT, UUID"),
        col("video_id", "TEXT, UUID → videos.id"),
        col("views_count", "BIGINT на момент замера"),
        col("likes_count", "BIGINT на момент замера"),
        col("comments_count", "BIGINT на момент замера"),
        col("reports_count", "BIGINT на момент замера"),
        col("delta_views_count", "BIGINT, изменение за час"),
        col("delta_likes_count", "BIGINT, изменение за час"),
        col("delta_comments_count", "BIGINT, изменение за час"),
        col("delta_reports_count", "BIGINT, изменение за час"),
        col("created_at", "TIMESTAMPTZ, UTC, момент замера"),
    ],
};

pub const TABLES: &[TableSpec] = &[VIDEOS, VIDEO_SNAPSHOTS];

/// Table names a statement must mention to pass the gate.
pub const KNOWN_TABLES: &[&str] = &[VIDEOS.name, VIDEO_SNAPSHOTS.name];

pub struct WorkedExample {
    pub question: &'static str,
    pub sql: &'static str,
}

pub const WORKED_EXAMPLES: &[WorkedExample] = &[
    WorkedExample {
        question: "Сколько всего видео?",
        sql: "SELECT COUNT(*) FROM videos;",
    },
    WorkedExample {
        question: "Сколько видео у креатора с id 8b76e572635b400c9052286a56176e03 вышло с 1 по 5 ноября 2025?",
        sql: "SELECT COUNT(*) FROM videos WHERE creator_id = '8b76e572635b400c9052286a56176e03' AND video_created_at >= '2025-11-01 00:00:00+00' AND video_created_at < '2025-11-06 00:00:00+00';",
    },
    WorkedExample {
        question: "Сколько замеров с отрицательным ростом просмотров?",
        sql: "SELECT COUNT(*) FROM video_snapshots WHERE delta_views_count < 0;",
    },
    WorkedExample {
        question: "Суммарный рост просмотров всех видео 28 ноября 2025?",
        sql: "SELECT SUM(delta_views_count) FROM video_snapshots WHERE created_at >= '2025-11-28 00:00:00+00' AND created_at < '2025-11-29 00:00:00+00';",
    },
    WorkedExample {
        question: "Сколько видео набрало больше 100000 просмотров?",
        sql: "SELECT COUNT(*) FROM videos WHERE views_count > 100000;",
    },
    WorkedExample {
        question: "Суммарные просмотры видео, опубликованных в июне 2025?",
        sql: "SELECT SUM(views_count) FROM videos WHERE video_created_at >= '2025-06-01 00:00:00+00' AND video_created_at < '2025-07-01 00:00:00+00';",
    },
    WorkedExample {
        question: "На сколько просмотров выросли видео креатора cd87be38b50b4fdd8342bb3c383f3c7d с 10:00 до 15:00 28 ноября 2025?",
        sql: "SELECT SUM(s.delta_views_count) FROM video_snapshots s JOIN videos v ON s.video_id = v.id WHERE v.creator_id = 'cd87be38b50b4fdd8342bb3c383f3c7d' AND s.created_at >= '2025-11-28 10:00:00+00' AND s.created_at < '2025-11-28 15:00:00+00';",
    },
    WorkedExample {
        question: "Сколько новых лайков получили все видео за 27 ноября 2025? Нужно сложить изменения лайков между замерами.",
        sql: "SELECT SUM(delta_likes_count) FROM video_snapshots WHERE created_at >= '2025-11-27 00:00:00+00' AND created_at < '2025-11-28 00:00:00+00';",
    },
    WorkedExample {
        question: "Для креатора с id aca1061a9d324ecf8c3fa2bb32d7be63 посчитай, в скольких разных календарных днях ноября 2025 года он публиковал хотя бы одно видео.",
        sql: "SELECT COUNT(DISTINCT (video_created_at AT TIME ZONE 'UTC')::date) FROM videos WHERE creator_id = 'aca1061a9d324ecf8c3fa2bb32d7be63' AND video_created_at >= '2025-11-01 00:00:00+00' AND video_created_at < '2025-12-01 00:00:00+00';",
    },
];

const ROLE: &str = "Ты — аналитический SQL-ассистент. По вопросу на русском языке сгенерируй ровно один корректный SQL-запрос к PostgreSQL, который возвращает одно целое число. Никаких пояснений, комментариев, markdown.";

const RULES: &[&str] = &[
    "Используй ТОЛЬКО указанные таблицы и колонки.",
    "ВСЕГДА фильтруй время через явный полуоткрытый диапазон в UTC, никогда не сравнивай col::date:\n   - Один день D: col >= 'D 00:00:00+00' AND col < 'D+1 00:00:00+00'\n   - Дни A–B включительно: col >= 'A 00:00:00+00' AND col < 'B+1 00:00:00+00'\n   - Время внутри дня: col >= '2025-11-28 10:00:00+00' AND col < '2025-11-28 15:00:00+00'",
    "Месяцы: январь=01, …, июнь=06, …, декабрь=12.",
    "UUID — в одинарных кавычках: creator_id = '...'.",
    "Вопросы про рост, прирост, изменение → только delta_*_count из video_snapshots. НИКОГДА не складывай delta_*_count с итоговыми *_count.",
    "Замеры по креатору → обязательно JOIN video_snapshots с videos (в video_snapshots нет creator_id).",
    "Дни публикации видео → таблица videos и video_created_at; дни замеров и динамика → video_snapshots и created_at.",
];

fn render() -> String {
    let mut out = String::new();
    out.push_str(ROLE);
    out.push_str("\n\n### Схема\n");
    for table in TABLES {
        out.push_str(&format!("Таблица {}:\n", table.name));
        for column in table.columns {
            out.push_str(&format!("- {} ({})\n", column.name, column.description));
        }
        out.push('\n');
    }
    out.push_str("### Правила\n");
    for (i, rule) in RULES.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, rule));
    }
    out.push_str("\n### Примеры\n");
    for example in WORKED_EXAMPLES {
        out.push_str(&format!("Вопрос: {}\nОтвет: {}\n\n", example.question, example.sql));
    }
    out.push_str("Теперь обработай запрос:");
    out
}

/// The rendered instruction prefix. Built once, never mutated.
pub fn prompt_prefix() -> &'static str {
    static PREFIX: OnceLock<String> = OnceLock::new();
    PREFIX.get_or_init(render)
}
