use serde_json::json;
use snow_http::{sys_id, Record, RecordClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = RecordClient::from_env()?;
    let incidents = client.table("incident");

    let data: Record = serde_json::from_value(json!({
        "category": "Request",
        "short_description": "Generated by snow-http demo",
        "state": "New"
    }))?;

    let created = incidents.insert(&data).await?.unwrap_or_default();
    let Some(id) = created.first().and_then(sys_id).map(str::to_owned) else {
        println!("service did not return the created record");
        return Ok(());
    };
    println!("created {id}");

    if let Some(record) = incidents.get(&id).await? {
        println!("{record:?}");
    }

    let keys = incidents
        .get_keys("short_description=Generated by snow-http demo")
        .await?;
    println!("{} matching incidents", keys.len());

    if let Some(deleted) = incidents.delete(&id).await? {
        println!("deleted {:?}", sys_id(&deleted));
    }

    Ok(())
}
