use clap::{Parser, Subcommand};
use rhdf5::message::datatype::DatatypeClass;
use rhdf5::{AttributeValue, Entry, File, Group};

#[derive(Parser)]
#[command(name = "h5ls", version = "0.1.0", about = "Inspect an HDF5 file's object graph")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the members of a group (default: the root group)
    List {
        input: String,
        #[arg(default_value = "/")]
        path: String,
    },
    /// Show superblock, datatype, dataspace, layout and attributes for a dataset
    Info {
        input: String,
        path: String,
    },
    /// Recursively walk the whole object graph and print a tree
    Tree {
        input: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Commands::List { input, path } => {
            let file = File::open(&input)?;
            let entry = file.open_path(&path)?;
            match entry {
                Entry::Group(g) => {
                    let members = g.members()?;
                    println!("{} ({} member(s))", path, members.len());
                    for name in members {
                        println!("  {}", name);
                    }
                }
                Entry::Dataset(d) => {
                    println!("{} is a dataset, shape {:?}", path, d.shape());
                }
            }
        }

        Commands::Info { input, path } => {
            let file = File::open(&input)?;
            println!("── {} ─────────────────────────────────", input);
            println!("  HDF5 superblock version: {}", file.version());
            match file.open_path(&path)? {
                Entry::Dataset(d) => {
                    println!("  Path:       {}", path);
                    println!("  Shape:      {:?}", d.shape());
                    println!("  Elements:   {}", d.element_count());
                    println!("  Datatype:   {}", describe_datatype(&d.datatype().class));
                    if let Some(modified) = d.modified() {
                        println!("  Modified:   {}", modified.to_rfc3339());
                    }
                    let attrs = d.attributes();
                    println!("  Attributes: {}", attrs.len());
                    for (name, value) in &attrs {
                        println!("    {} = {}", name, describe_attribute(value));
                    }
                }
                Entry::Group(g) => {
                    println!("  Path:    {}", path);
                    println!("  Members: {}", g.members()?.len());
                    if let Some(modified) = g.modified() {
                        println!("  Modified: {}", modified.to_rfc3339());
                    }
                }
            }
        }

        Commands::Tree { input } => {
            let file = File::open(&input)?;
            println!("{}", input);
            let root = file.root()?;
            print_tree(&file, &root, 1)?;
        }
    }

    Ok(())
}

fn print_tree(file: &File, group: &Group, depth: usize) -> Result<(), Box<dyn std::error::Error>> {
    let indent = "  ".repeat(depth);
    for name in group.members()? {
        let child_path = format!("{}/{}", group.path.trim_end_matches('/'), name);
        match file.open_path(&child_path)? {
            Entry::Group(child) => {
                println!("{}{}/", indent, name);
                print_tree(file, &child, depth + 1)?;
            }
            Entry::Dataset(d) => {
                println!("{}{}  {:?}  {}", indent, name, d.shape(), describe_datatype(&d.datatype().class));
            }
        }
    }
    Ok(())
}

fn describe_datatype(class: &DatatypeClass) -> String {
    match class {
        DatatypeClass::FixedPoint { signed, bit_precision, .. } => {
            format!("{}int{}", if *signed { "" } else { "u" }, bit_precision)
        }
        DatatypeClass::FloatingPoint { exponent_size, mantissa_size, .. } => {
            format!("float{}", 1 + *exponent_size as u32 + *mantissa_size as u32)
        }
        DatatypeClass::Str { .. } => "string".to_string(),
        DatatypeClass::BitField { .. } => "bitfield".to_string(),
        DatatypeClass::Opaque { tag } => format!("opaque({tag})"),
        DatatypeClass::Compound { members } => {
            let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
            format!("compound{{{}}}", names.join(", "))
        }
        DatatypeClass::Reference => "reference".to_string(),
        DatatypeClass::Time { .. } => "time".to_string(),
        DatatypeClass::Enum { base, .. } => format!("enum<{}>", describe_datatype(&base.class)),
        DatatypeClass::VarLen { base, .. } => format!("varlen<{}>", describe_datatype(&base.class)),
        DatatypeClass::Array { base, dims } => format!("array{:?}<{}>", dims, describe_datatype(&base.class)),
    }
}

fn describe_attribute(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Integer(v) => v.to_string(),
        AttributeValue::UnsignedInteger(v) => v.to_string(),
        AttributeValue::Float(v) => v.to_string(),
        AttributeValue::Str(s) => format!("{s:?}"),
        AttributeValue::IntegerArray(vs) => format!("{vs:?}"),
        AttributeValue::FloatArray(vs) => format!("{vs:?}"),
        AttributeValue::Raw(bytes) => format!("<{} raw bytes>", bytes.len()),
    }
}
