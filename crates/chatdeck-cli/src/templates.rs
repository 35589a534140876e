// Chatdeck CLI — template library commands.
// Purely local: the catalog is static data shipped with the dashboard.

use chatdeck_core::{SavedTemplate, TemplateCatalog};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum TemplatesCommand {
    /// List every saved template.
    List,
    /// Search name, description, and category (case-insensitive).
    Search { term: String },
    /// Show one template in full, preview style.
    Show { id: String },
    /// List the distinct template categories.
    Categories,
}

pub fn run(command: TemplatesCommand) {
    let catalog = TemplateCatalog::builtin();

    match command {
        TemplatesCommand::List => {
            for t in catalog.all() {
                print_row(t);
            }
        }
        TemplatesCommand::Search { term } => {
            let hits = catalog.search(&term);
            if hits.is_empty() {
                println!("No templates match '{term}'.");
                return;
            }
            for t in hits {
                print_row(t);
            }
        }
        TemplatesCommand::Show { id } => match catalog.get(&id) {
            Some(t) => {
                println!("{} — {}", t.name, t.category);
                println!("{}", t.description);
                println!("Created: {}", t.created_at);
                println!();
                println!("{}", t.content);
            }
            None => println!("No template with id '{id}'."),
        },
        TemplatesCommand::Categories => {
            for category in catalog.categories() {
                println!("{category}");
            }
        }
    }
}

fn print_row(t: &SavedTemplate) {
    println!("[{}] {:<18} {:<10} {}", t.id, t.name, t.category, t.description);
}
