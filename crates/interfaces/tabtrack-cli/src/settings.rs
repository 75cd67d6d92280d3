use anyhow::{anyhow, Result};
use tabtrack_config::WORKBOOK_KEY;
use tabtrack_pipeline::ExtensionSettings;

pub fn handle_show(settings: &ExtensionSettings) -> Result<()> {
    let meta = settings.user_metadata()?;
    println!(
        "Deployment ID: {}",
        settings.deployment_id().as_deref().unwrap_or("(not set)")
    );
    println!(
        "Workbook:      {}",
        meta.workbook_name()
            .filter(|w| !w.is_empty())
            .unwrap_or("(not set)")
    );

    let pairs: Vec<_> = meta.custom_pairs().collect();
    if pairs.is_empty() {
        println!("No custom metadata.");
    } else {
        println!("\n{:<24} {:<40}", "KEY", "VALUE");
        println!("{:-<24} {:-<40}", "", "");
        for (k, v) in pairs {
            let v = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
            println!("{:<24} {:<40}", k, v);
        }
    }

    if !settings.is_configured() {
        println!("\n:: Action required: set a deployment id and a workbook name.");
    }
    Ok(())
}

pub fn handle_set_deployment(settings: &ExtensionSettings, id: &str) -> Result<()> {
    let id = id.trim();
    if id.is_empty() {
        return Err(anyhow!("Deployment ID cannot be empty"));
    }
    settings.set_deployment_id(id)?;
    println!("Deployment ID set to '{}'.", id);
    Ok(())
}

pub fn handle_set_workbook(settings: &ExtensionSettings, name: &str) -> Result<()> {
    if name.is_empty() {
        println!("Empty workbook name ignored; keeping the current one.");
        return Ok(());
    }
    settings.set_workbook_name(name)?;
    println!("Workbook name set to '{}'.", name);
    Ok(())
}

pub fn handle_meta_add(settings: &ExtensionSettings) -> Result<()> {
    let key = settings.add_metadata_pair()?;
    println!("Added metadata key '{}'.", key);
    Ok(())
}

pub fn handle_meta_set(settings: &ExtensionSettings, key: &str, value: &str) -> Result<()> {
    reject_workbook_key(key)?;
    settings.set_metadata(key, value)?;
    println!("'{}' = '{}'", key, value);
    Ok(())
}

pub fn handle_meta_rename(settings: &ExtensionSettings, key: &str, new_key: &str) -> Result<()> {
    reject_workbook_key(key)?;
    reject_workbook_key(new_key)?;
    if new_key.trim().is_empty() {
        return Err(anyhow!("Metadata key cannot be empty"));
    }
    if !settings.rename_metadata(key, new_key)? {
        return Err(anyhow!("Metadata key '{}' not found", key));
    }
    println!("Renamed '{}' to '{}'.", key, new_key);
    Ok(())
}

pub fn handle_meta_remove(settings: &ExtensionSettings, key: &str) -> Result<()> {
    reject_workbook_key(key)?;
    if !settings.remove_metadata(key)? {
        return Err(anyhow!("Metadata key '{}' not found", key));
    }
    println!("Metadata key '{}' removed.", key);
    Ok(())
}

fn reject_workbook_key(key: &str) -> Result<()> {
    if key == WORKBOOK_KEY {
        return Err(anyhow!(
            "'{}' is managed by set-workbook",
            WORKBOOK_KEY
        ));
    }
    Ok(())
}
