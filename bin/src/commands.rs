//! Subcommand implementations.

use birch::{
    outline::{materialize_deep, Children, OutlineNode},
    StringSurface, Workbench,
};
use birch_markup::{parse, serialize, NodePath};
use std::{error::Error, fs, path::Path};

pub fn validate(file: &Path) -> Result<(), Box<dyn Error>> {
    let text = fs::read_to_string(file)?;
    match parse(&text) {
        Ok(root) => {
            println!("{}: ok, {} elements", file.display(), root.subtree_len());
            Ok(())
        }
        Err(err) => Err(format!("{}: {err}", file.display()).into()),
    }
}

pub fn format(file: &Path, write: bool) -> Result<(), Box<dyn Error>> {
    let text = fs::read_to_string(file)?;
    let root = parse(&text)?;
    let formatted = serialize(&root);
    if write {
        if formatted != text {
            fs::write(file, &formatted)?;
            tracing::info!(file = %file.display(), "rewrote in canonical form");
        }
    } else {
        print!("{formatted}");
    }
    Ok(())
}

pub fn outline(file: &Path, depth: Option<usize>) -> Result<(), Box<dyn Error>> {
    let text = fs::read_to_string(file)?;
    let root = parse(&text)?;
    print_node(&materialize_deep(&root, depth), 0);
    Ok(())
}

fn print_node(node: &OutlineNode, indent: usize) {
    let pad = "  ".repeat(indent);
    let mut line = format!("{pad}{} {}", node.class.glyph(), node.label);
    if !node.value.is_empty() {
        line.push_str(&format!(": {}", node.value));
    }
    if !node.attr_summary.is_empty() {
        line.push_str(&format!(" [{}]", node.attr_summary));
    }
    println!("{line}");
    match &node.children {
        Children::Expanded(children) => {
            for child in children {
                print_node(child, indent + 1);
            }
        }
        // Depth limit reached; mark the cut the way a collapsed row reads.
        Children::Unexpanded => println!("{pad}  ..."),
    }
}

pub fn set(file: &Path, path: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let path: NodePath = path.parse()?;
    let text = fs::read_to_string(file)?;

    let mut workbench = Workbench::new();
    let mut surface = StringSurface::new(text);
    workbench.open_text(surface.text.clone());
    workbench
        .wait_for_build()
        .ok_or("no build requested")??;

    let new_text = workbench.apply_tree_edit(&mut surface, &path, value)?;
    fs::write(file, &new_text)?;
    workbench.close();
    println!("{}: updated {path}", file.display());
    Ok(())
}
