use pretty_assertions::assert_eq;
use querylog_studio::aggregator::{
    count_excess_duplicates, filter_by, summarize, top_by_frequency, KeySpec, QueryField, QueryKey,
    Seconds, Summary,
};
use querylog_studio::parser::{
    CapturedQuery, ContextLine, Query, QueryRecord, StackFrame, TemplateInfo,
};
use querylog_studio::utils::QueryError;

fn query(sql: &str, raw_sql: &str, duration: f64) -> Query {
    Query::new(CapturedQuery::new(
        "default",
        QueryRecord {
            sql: sql.to_string(),
            raw_sql: raw_sql.to_string(),
            duration,
            stacktrace: vec![
                StackFrame::new("shop/views.py", 20, "book_list"),
                StackFrame::new("shop/models.py", 51, "price"),
            ],
            template_info: None,
        },
    ))
}

fn template_query(sql: &str) -> Query {
    let mut record = query(sql, sql, 0.25).record().clone();
    record.template_info = Some(TemplateInfo {
        name: "shop/list.html".to_string(),
        context: vec![ContextLine {
            num: 12,
            content: "    {{ book.publisher.name }}".to_string(),
            highlight: true,
        }],
    });
    Query::new(CapturedQuery::new("default", record))
}

#[test]
fn test_excess_duplicates_by_sql() {
    let queries = vec![
        query("A", "A", 0.1),
        query("A", "A", 0.1),
        query("A", "A", 0.1),
        query("B", "B", 0.1),
    ];

    let excess = count_excess_duplicates(&queries, &KeySpec::field(QueryField::Sql)).unwrap();
    assert_eq!(excess, 2);
}

#[test]
fn test_top_by_frequency_limit() {
    let mut queries = Vec::new();
    for _ in 0..3 {
        queries.push(query("A", "A", 0.5));
    }
    for _ in 0..2 {
        queries.push(query("B", "B", 0.25));
    }
    queries.push(query("C", "C", 1.0));

    let top = top_by_frequency(&queries, &KeySpec::field(QueryField::Sql), 2).unwrap();

    assert_eq!(top.len(), 2);
    assert_eq!(top[0].key, QueryKey::from("A"));
    assert_eq!(top[0].count, 3);
    assert_eq!(top[0].duration, 1.5);
    assert_eq!(top[1].key, QueryKey::from("B"));
    assert_eq!(top[1].count, 2);
    assert_eq!(top[1].duration, 0.5);
}

#[test]
fn test_summarize_empty() {
    let summary = summarize(&[]);
    assert_eq!(summary, Summary::default());
    assert_eq!(summary.queries, 0);
    assert_eq!(summary.duration, 0.0);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "queries": 0,
            "duration": 0.0,
            "template queries": 0,
            "duplicate exact-sql": 0,
            "duplicate param-sql": 0
        })
    );
}

#[test]
fn test_summarize_counts() {
    let queries = vec![
        query("SELECT * FROM book WHERE id = 1", "SELECT * FROM book WHERE id = %s", 0.25),
        query("SELECT * FROM book WHERE id = 2", "SELECT * FROM book WHERE id = %s", 0.25),
        query("SELECT * FROM book WHERE id = 2", "SELECT * FROM book WHERE id = %s", 0.25),
        template_query("SELECT * FROM publisher"),
    ];

    let summary = summarize(&queries);

    assert_eq!(summary.queries, 4);
    assert_eq!(summary.duration, 1.0);
    assert_eq!(summary.template_queries, 1);
    assert_eq!(summary.duplicate_exact_sql, 1);
    assert_eq!(summary.duplicate_param_sql, 2);
}

#[test]
fn test_call_site_fields_agree() {
    let q = query("SELECT 1", "SELECT 1", 0.0);

    let file = q.file().unwrap().to_string();
    let function = q.function().unwrap();
    let codeline = q.codeline().unwrap();

    assert_eq!(function.file, file);
    assert_eq!(codeline.file, file);
    assert_eq!(codeline.function, function.function);
    assert_eq!(codeline.lineno, q.stacktrace().last().unwrap().lineno());
}

#[test]
fn test_group_by_template_line() {
    let queries = vec![
        template_query("SELECT * FROM publisher WHERE id = 1"),
        template_query("SELECT * FROM publisher WHERE id = 2"),
        query("SELECT 1", "SELECT 1", 0.002),
    ];

    let top = top_by_frequency(&queries, &KeySpec::field(QueryField::Template), 10).unwrap();

    assert_eq!(top.len(), 2);
    assert_eq!(top[0].count, 2);
    assert_eq!(top[0].key.to_string(), "shop/list.html:12 {{ book.publisher.name }}");
    assert_eq!(top[1].key, QueryKey::Template(None));
}

#[test]
fn test_custom_key_function() {
    let queries = vec![
        query("SELECT 1", "SELECT 1", 0.002),
        query("UPDATE t SET x = 1", "UPDATE t SET x = %s", 0.004),
        query("SELECT 2", "SELECT 2", 0.003),
    ];
    let by_verb = KeySpec::function(|q: &Query| {
        let verb = q.sql().split_whitespace().next().unwrap_or("").to_string();
        Ok(QueryKey::Text(verb))
    });

    let selects = filter_by(&queries, &by_verb, &QueryKey::from("SELECT")).unwrap();
    assert_eq!(selects.len(), 2);

    let excess = count_excess_duplicates(&queries, &by_verb).unwrap();
    assert_eq!(excess, 1);
}

#[test]
fn test_identity_key_groups_equal_records() {
    let queries = vec![query("A", "A", 0.1), query("A", "A", 0.1), query("A", "A", 0.2)];

    let top = top_by_frequency(&queries, &KeySpec::Identity, 10).unwrap();

    assert_eq!(top.len(), 2);
    assert_eq!(top[0].count, 2);
    assert_eq!(top[1].count, 1);
}

#[test]
fn test_key_errors_propagate() {
    let traceless = Query::new(CapturedQuery::new(
        "default",
        QueryRecord {
            stacktrace: Vec::new(),
            ..query("A", "A", 0.1).record().clone()
        },
    ));
    let queries = vec![query("A", "A", 0.1), traceless];

    let result = top_by_frequency(&queries, &KeySpec::field(QueryField::Codeline), 10);
    assert_eq!(result, Err(QueryError::EmptyTrace));

    // Keys that do not touch the stack trace still work
    assert_eq!(count_excess_duplicates(&queries, &KeySpec::field(QueryField::Sql)), Ok(1));
}

#[test]
fn test_group_by_duration_is_exact() {
    let queries = vec![
        query("A", "A", 0.0000001),
        query("A", "A", 0.0000004),
        query("A", "A", 0.0000001),
    ];
    let by_duration = KeySpec::field(QueryField::Duration);

    let top = top_by_frequency(&queries, &by_duration, 10).unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].key, QueryKey::Seconds(Seconds(0.0000001)));
    assert_eq!(top[0].count, 2);
    assert_eq!(top[1].count, 1);

    let matched = filter_by(&queries, &by_duration, &QueryKey::Seconds(Seconds(0.0000004))).unwrap();
    assert_eq!(matched.len(), 1);
}
