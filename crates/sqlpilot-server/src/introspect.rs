//! Manual table introspection: connect, print the column listing, exit.

use sqlpilot_core::AppConfig;
use sqlpilot_db::DbClient;
use std::path::Path;

pub async fn run(config_path: &Path, table: Option<&str>) -> anyhow::Result<()> {
    let cfg = AppConfig::from_file(config_path)?;
    let db_cfg = cfg.database.clone().ok_or_else(|| {
        anyhow::anyhow!(
            "no database section in {}; introspection needs one",
            config_path.display()
        )
    })?;

    let default_table = match cfg.prompt.table_name.trim() {
        "" => None,
        name => Some(name.to_string()),
    };

    let mut db = DbClient::new(db_cfg, default_table);
    db.connect().await?;
    let result = db.get_table_schema(table).await;
    db.disconnect().await;

    let columns = result?;
    println!("{}", serde_json::to_string_pretty(&columns)?);
    Ok(())
}
