use skipdb::{SkipDB, options::DBOpenOptions};
use tracing_subscriber::EnvFilter;

fn main() -> skipdb::error::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let db: SkipDB<i32, String> = DBOpenOptions::new()
        .max_level(6)
        .dump_path("./dumpFile")
        .open()?;

    let report = db.load()?;
    println!("load: {report:?}");
    if db.is_empty() {
        for (key, value) in [
            (1, "a"),
            (3, "c"),
            (7, "g"),
            (8, "h"),
            (9, "i"),
            (10, "j"),
            (16, "p"),
            (17, "q"),
            (25, "y"),
            (26, "z"),
        ] {
            db.put(key, value.to_string())?;
        }
    }
    println!("skipList size: {}", db.len());

    for key in [9, 18] {
        match db.get(&key) {
            Some(value) => println!("Found: (Key = {key}, Value = {value})"),
            None => println!("Not Found Key: {key}"),
        }
    }

    print!("{}", db.display());

    for key in [3, 7] {
        match db.delete(&key) {
            Ok(value) => println!("Successfully deleted ({key}, {value})"),
            Err(e) => println!("Delete {key}: {e}"),
        }
    }
    println!("skipList size: {}", db.len());

    print!("{}", db.display());

    let written = db.dump()?;
    println!("dumped {written} entries to {}", db.options().dump_path().display());

    Ok(())
}
