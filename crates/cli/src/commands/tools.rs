//! `reagent tools` — List the available tools.

pub fn run(config_path: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)
        .map_err(|e| format!("Failed to load config: {e}"))?;

    let registry = reagent_tools::default_registry(
        config.tools.retrieval_url.as_deref(),
        config.tools.retrieval_top_k,
    )?;

    for spec in registry.specs() {
        println!("{}", spec.name);
        println!("  {}", spec.description);
        println!("  arguments: {}", spec.parameters);
        println!();
    }

    Ok(())
}
