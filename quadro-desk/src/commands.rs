use std::fs;

use quadro_core::storage::KeyValueStorage;
use quadro_core::template::{builtin_template, builtin_templates};
use quadro_core::{CreateProjectOptions, WorkspaceStore};

use crate::cli::Command;

/// Run one command against the store. Output goes to stdout.
pub fn run<S: KeyValueStorage>(store: &mut WorkspaceStore<S>, command: Command) -> Result<(), String> {
    match command {
        Command::List => {
            for line in list_lines(store) {
                println!("{}", line);
            }
        }
        Command::Templates => {
            for template in builtin_templates() {
                println!(
                    "{}\t{} ({} columns, {} layers)",
                    template.id,
                    template.name,
                    template.columns.len(),
                    template.layers.len()
                );
            }
        }
        Command::New { name, template } => {
            let template = template
                .map(|id| builtin_template(&id).ok_or_else(|| format!("unknown template {}", id)))
                .transpose()?;
            let options = CreateProjectOptions {
                template,
                ..CreateProjectOptions::default()
            };
            let project = store.create_project(&name.join(" "), options);
            println!("{}", project.id);
        }
        Command::Select { id } => {
            if store.workspace().project(&id).is_none() {
                return Err(format!("no project {}", id));
            }
            store.select_project(&id);
        }
        Command::Version => {
            let id = store.workspace().active_project_id.clone();
            let copy = store
                .duplicate_project_version(&id)
                .ok_or_else(|| format!("no project {}", id))?;
            println!("{}\tv{}", copy.id, copy.version);
        }
        Command::Delete => {
            let removed = store.delete_active_project().map_err(|e| e.to_string())?;
            println!("deleted {}", removed.id);
        }
        Command::Export { file } => {
            let json = store.export_active_json().map_err(|e| e.to_string())?;
            match file {
                Some(path) => {
                    fs::write(&path, json).map_err(|e| format!("{}: {}", path.display(), e))?
                }
                None => println!("{}", json),
            }
        }
        Command::Import { file, overwrite } => {
            let text =
                fs::read_to_string(&file).map_err(|e| format!("{}: {}", file.display(), e))?;
            if overwrite {
                let changed = store.import_text_overwrite(&text).map_err(|e| e.to_string())?;
                if !changed {
                    println!("nothing changed");
                }
            } else {
                let project = store.import_text_as_new(&text).map_err(|e| e.to_string())?;
                println!("{}", project.id);
            }
        }
    }
    Ok(())
}

fn list_lines<S: KeyValueStorage>(store: &WorkspaceStore<S>) -> Vec<String> {
    let workspace = store.workspace();
    workspace
        .projects
        .iter()
        .map(|project| {
            let marker = if project.id == workspace.active_project_id { "*" } else { " " };
            format!(
                "{} {}\t{}\tv{}\t{} cards\t{}",
                marker,
                project.id,
                project.name,
                project.version,
                project.card_count(),
                project.template.name
            )
        })
        .collect()
}
