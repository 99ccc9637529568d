// crates/server/src/dashboards.rs
//! Built-in dashboards over the upstream `system.*` tables. Queries use the
//! time-span placeholders that get substituted per refresh.

use serde::Serialize;

use houseview_types::{
    FieldHints, PaginationMode, PanelDescriptor, PanelKind, SortDirection, SortSpec,
};

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub id: String,
    pub title: String,
    pub panels: Vec<PanelDescriptor>,
}

pub fn builtin_dashboards() -> Vec<Dashboard> {
    vec![queries(), merges(), processes(), replicas()]
}

fn queries() -> Dashboard {
    Dashboard {
        id: "queries".into(),
        title: "Queries".into(),
        panels: vec![
            PanelDescriptor::new("query-rate", "Queries over time", PanelKind::Timeseries)
                .with_query(
                    "SELECT toStartOfInterval(event_time, INTERVAL {rounding:UInt32} SECOND) \
                     AS t, count() AS queries \
                     FROM system.query_log \
                     WHERE type = 'QueryFinish' \
                       AND event_time >= toDateTime({startTimestamp:UInt32}) \
                       AND event_time <= toDateTime({endTimestamp:UInt32}) \
                     GROUP BY t ORDER BY t",
                )
                .with_hints(FieldHints::timeseries("t")),
            PanelDescriptor::new("query-duration", "Slowest queries", PanelKind::Table)
                .with_query(
                    "SELECT query_id, user, query_duration_ms, read_rows, \
                     substring(query, 1, 120) AS query \
                     FROM system.query_log \
                     WHERE type = 'QueryFinish' \
                       AND event_time >= parseDateTimeBestEffort({from:String}) \
                       AND event_time <= parseDateTimeBestEffort({to:String}) \
                       AND query ILIKE {filter:String} \
                     ORDER BY query_duration_ms DESC",
                )
                .with_pagination(PaginationMode::Server, 100)
                .with_sort(SortSpec::new("query_duration_ms", SortDirection::Desc)),
            PanelDescriptor::new("query-total", "Queries in span", PanelKind::Stat).with_query(
                "SELECT count() AS queries FROM system.query_log \
                 WHERE type = 'QueryFinish' \
                   AND event_time >= toDateTime({startTimestamp:UInt32}) \
                   AND event_time <= toDateTime({endTimestamp:UInt32})",
            ),
        ],
    }
}

fn merges() -> Dashboard {
    Dashboard {
        id: "merges".into(),
        title: "Merges & Parts".into(),
        panels: vec![
            PanelDescriptor::new("merge-rate", "Merged rows over time", PanelKind::Timeseries)
                .with_query(
                    "SELECT toStartOfInterval(event_time, INTERVAL {rounding:UInt32} SECOND) \
                     AS t, sum(rows) AS merged_rows \
                     FROM system.part_log \
                     WHERE event_type = 'MergeParts' \
                       AND event_time >= toDateTime({startTimestamp:UInt32}) \
                       AND event_time <= toDateTime({endTimestamp:UInt32}) \
                     GROUP BY t ORDER BY t",
                )
                .with_hints(FieldHints::timeseries("t")),
            PanelDescriptor::new("parts-by-table", "Parts by table", PanelKind::Pie)
                .with_query(
                    "SELECT concat(database, '.', table) AS table, count() AS parts \
                     FROM system.parts WHERE active GROUP BY table ORDER BY parts DESC",
                )
                .with_hints(FieldHints::pie("table", "parts", 8)),
            PanelDescriptor::new("recent-merges", "Recent merges", PanelKind::Table).with_query(
                "SELECT event_time, database, table, duration_ms, rows, \
                 formatReadableSize(size_in_bytes) AS size \
                 FROM system.part_log \
                 WHERE event_type = 'MergeParts' \
                   AND event_time >= toDateTime({startTimestamp:UInt32}) \
                   AND event_time <= toDateTime({endTimestamp:UInt32}) \
                 ORDER BY event_time DESC LIMIT 200",
            ),
        ],
    }
}

fn processes() -> Dashboard {
    Dashboard {
        id: "processes".into(),
        title: "Processes".into(),
        panels: vec![
            PanelDescriptor::new("running-queries", "Running queries", PanelKind::Table)
                .with_query(
                    "SELECT query_id, user, elapsed, read_rows, \
                     formatReadableSize(memory_usage) AS memory, \
                     substring(query, 1, 120) AS query \
                     FROM system.processes \
                     WHERE query ILIKE {filter:String} \
                     ORDER BY elapsed DESC",
                )
                .with_sort(SortSpec::new("elapsed", SortDirection::Desc)),
            PanelDescriptor::new("server-settings", "Server build", PanelKind::TransposeTable)
                .with_query(
                    "SELECT version() AS version, uptime() AS uptime_seconds, \
                     currentDatabase() AS database",
                ),
        ],
    }
}

fn replicas() -> Dashboard {
    Dashboard {
        id: "replicas".into(),
        title: "Replicas".into(),
        panels: vec![
            PanelDescriptor::new("replica-queues", "Replication queue", PanelKind::Table)
                .with_query(
                    "SELECT database, table, replica_name, queue_size, \
                     absolute_delay \
                     FROM system.replicas \
                     ORDER BY queue_size DESC",
                )
                .with_sort(SortSpec::new("queue_size", SortDirection::Desc)),
            PanelDescriptor::new("max-delay", "Max replica delay", PanelKind::Stat)
                .with_query("SELECT max(absolute_delay) AS delay FROM system.replicas")
                .with_hints(FieldHints::stat_unit("s")),
        ],
    }
}
