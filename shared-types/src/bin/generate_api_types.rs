use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for API types
    let mut types = Vec::new();

    // Lead types
    types.push(clean_type(Lead::export_to_string()?));
    types.push(clean_type(LeadStatus::export_to_string()?));
    types.push(clean_type(LeadPriority::export_to_string()?));
    types.push(clean_type(CommunicationEntry::export_to_string()?));
    types.push(clean_type(AttachedDocument::export_to_string()?));

    // Request/response types
    types.push(clean_type(CreateLeadRequest::export_to_string()?));
    types.push(clean_type(CaptureLeadRequest::export_to_string()?));
    types.push(clean_type(CaptureLeadResponse::export_to_string()?));
    types.push(clean_type(UpdateLeadRequest::export_to_string()?));
    types.push(clean_type(AppendLogRequest::export_to_string()?));
    types.push(clean_type(AppendDocumentRequest::export_to_string()?));
    types.push(clean_type(LeadsResponse::export_to_string()?));

    let output_dir = Path::new("../gui/src/api-types");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    // Keep cross-type imports; strip the per-file generated banner
    let lines: Vec<&str> = type_def.lines().collect();
    let has_import = lines
        .iter()
        .any(|line| line.trim().starts_with("import type"));

    let filtered: Vec<&str> = lines
        .iter()
        .filter(|line| {
            let trimmed = line.trim();
            if trimmed.starts_with("import type") {
                return has_import;
            }
            !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .cloned()
        .collect();

    filtered.join("\n").trim().to_string()
}
