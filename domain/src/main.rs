use std::env;
use std::process;

use domain::adapters::memory_repo::InMemoryItemRepo;
use domain::service::ItemService;
use domain::{Item, ItemSearch};

fn print_usage() {
    eprintln!(
        "{}\n\nUsage:\n  domain save <name> <price> <quantity>\n  domain find [--name <pattern>] [--max-price <n>]\n\nNotes:\n  - This demo CLI uses an in-memory store seeded with itemA and itemB; data is not persisted across runs.",
        domain::about()
    );
}

fn parse_int(flag: &str, val: &str) -> Result<i32, String> {
    val.parse::<i32>()
        .map_err(|_| format!("{} must be an integer, got '{}'", flag, val))
}

fn print_item(item: &Item) {
    let id = item.id.map(|i| i.to_string()).unwrap_or_else(|| "-".into());
    println!("{}\t{}\t{}\t{}", id, item.name, item.price, item.quantity);
}

fn run() -> Result<(), String> {
    let mut args = env::args().skip(1); // skip program name

    let Some(cmd) = args.next() else {
        print_usage();
        return Ok(());
    };

    let svc = ItemService::new(InMemoryItemRepo::new());
    for seed in [Item::new("itemA", 10000, 10), Item::new("itemB", 20000, 20)] {
        svc.save(seed).map_err(|e| format!("seed failed: {}", e))?;
    }

    match cmd.as_str() {
        "save" => {
            let rest: Vec<String> = args.collect();
            let [name, price, quantity] = rest.as_slice() else {
                return Err("save expects <name> <price> <quantity>".into());
            };
            let item = Item::new(
                name.clone(),
                parse_int("price", price)?,
                parse_int("quantity", quantity)?,
            );
            match svc.save(item) {
                Ok(saved) => {
                    print_item(&saved);
                    Ok(())
                }
                Err(e) => Err(format!("save failed: {}", e)),
            }
        }
        "find" => {
            let mut search = ItemSearch::all();

            // Parse simple flags: --name <val>, --max-price <n>
            let rest: Vec<String> = args.collect();
            let mut i = 0;
            while i < rest.len() {
                match rest[i].as_str() {
                    "--name" => {
                        if i + 1 >= rest.len() {
                            return Err("--name requires a value".into());
                        }
                        search.name_pattern = Some(rest[i + 1].clone());
                        i += 2;
                    }
                    "--max-price" => {
                        if i + 1 >= rest.len() {
                            return Err("--max-price requires a value".into());
                        }
                        search.max_price = Some(parse_int("--max-price", &rest[i + 1])?);
                        i += 2;
                    }
                    unk => {
                        return Err(format!("unknown argument: {}", unk));
                    }
                }
            }

            match svc.find_items(&search) {
                Ok(items) => {
                    items.iter().for_each(print_item);
                    Ok(())
                }
                Err(e) => Err(format!("find failed: {}", e)),
            }
        }
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn main() {
    if let Err(msg) = run() {
        eprintln!("error: {}", msg);
        process::exit(1);
    }
}
