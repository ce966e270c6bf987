//! Compile a JSON where-map into SQL without touching a database.
//!
//! Run with:
//!   cargo run --example where_map -p pgbase
//!   cargo run --example where_map -p pgbase -- '{"id": ["in", [1, 2]], "_logic": "or"}'
//!
//! Set `RUST_LOG=pgbase=trace` to see the compiler and parser events.

use pgbase::{OrmResult, SqlQb, WhereMap, WhereTarget, qb};
use serde_json::json;

fn main() -> OrmResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let input = match std::env::args().nth(1) {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| pgbase::OrmError::invalid_condition(e.to_string()))?,
        None => json!({
            "id": ["in", [1, 2, 3]],
            "category_id": ["<>", 9],
            "title": ["like", "%rust%"],
            "bogus": ["~", 1],
        }),
    };

    println!("input: {input}");

    match WhereMap::from_json(&input) {
        Ok(map) => print_queries("strict", &map),
        Err(e) => println!("strict:  {e}"),
    }

    let lenient = WhereMap::from_json_lenient(&input)?;
    print_queries("lenient", &lenient);
    Ok(())
}

fn print_queries(label: &str, map: &WhereMap) {
    let select = qb::select("posts").soft_delete("deleted_at").where_map(map);
    let (sql, params) = select.build();
    println!("{label}: {sql}");
    for (i, p) in params.iter().enumerate() {
        println!("  ${} = {:?}", i + 1, p);
    }
}
