use cqlgraph::config::StoreConfig;
use cqlgraph::query::condition::Condition;
use cqlgraph::query::plan::Query;
use cqlgraph::query::translate;
use cqlgraph::{ColumnKey, CqlTable, EntityKind, all_tables};
use std::path::Path;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return Err("missing command".into());
    }
    match args[1].as_str() {
        "schema" => cmd_schema(&args[2..]),
        "translate" => cmd_translate(&args[2..]),
        other => {
            print_usage();
            Err(format!("unknown top-level command: {other}"))
        }
    }
}

fn cmd_schema(args: &[String]) -> Result<(), String> {
    let config = parse_config(args)?;
    println!("-- keyspace {}", config.keyspace);
    for table in all_tables(&config) {
        println!("{}", table.definition().create_table().to_cql());
        for index in table.definition().create_indexes() {
            println!("{}", index.to_cql());
        }
    }
    Ok(())
}

fn cmd_translate(args: &[String]) -> Result<(), String> {
    let config = parse_config(args)?;
    let kind_name = parse_flag_value(args, "--table").unwrap_or_else(|| "vertex".into());
    let kind =
        EntityKind::parse(&kind_name).ok_or_else(|| format!("unknown table kind: {kind_name}"))?;
    let table = CqlTable::new(kind).with_config(config);

    let mut query = Query::new(kind).ids(parse_flag_values(args, "--id"));
    if let Some(label) = parse_flag_value(args, "--label") {
        query = query.condition(Condition::eq(ColumnKey::Label, label));
    }
    if let Some(limit) = parse_flag_value(args, "--limit") {
        let limit = limit
            .parse::<u64>()
            .map_err(|e| format!("invalid --limit: {e}"))?;
        query = query.limit(limit);
    }

    let selects = translate(&table, &query).map_err(|e| format!("{}: {e}", e.code_str()))?;
    for select in selects {
        let stmt = select.to_cql();
        println!("{}\t{:?}", stmt.text, stmt.values);
    }
    Ok(())
}

fn parse_config(args: &[String]) -> Result<StoreConfig, String> {
    let mut config = match parse_flag_value(args, "--config") {
        Some(path) => StoreConfig::from_json_file(Path::new(&path)).map_err(|e| e.to_string())?,
        None => StoreConfig::default(),
    };
    if let Some(keyspace) = parse_flag_value(args, "--keyspace") {
        config = config.with_keyspace(keyspace);
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn parse_flag_value(args: &[String], flag: &str) -> Option<String> {
    for idx in 0..args.len() {
        if args[idx] == flag {
            return args.get(idx + 1).cloned();
        }
    }
    None
}

fn parse_flag_values(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2)
        .filter(|pair| pair[0] == flag)
        .map(|pair| pair[1].clone())
        .collect()
}

fn print_usage() {
    eprintln!("usage:");
    eprintln!("  cqlgraph schema [--keyspace <name>] [--config <config.json>]");
    eprintln!(
        "  cqlgraph translate [--table <kind>] [--id <id>]... [--label <label>] [--limit <n>] [--config <config.json>]"
    );
}
