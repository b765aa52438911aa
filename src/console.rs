//! Interactive administrative console
//!
//! Line-oriented surface over the registry: register test interfaces,
//! attach and detach ports, change addresses, toggle link state. Each
//! command maps 1:1 onto a registry or bridge operation.

use crate::error::{Error, Result};
use crate::hwaddr::HwAddr;
use crate::iface::{IfaceHandle, IfaceKind};
use crate::registry::Registry;
use std::io::{self, BufRead, Write};

const HELP: &str = "\
Commands:
  iface <name>             register an ethernet interface
  attach <bridge> <iface>  enslave an interface to a bridge
  detach <bridge> <iface>  release an interface from a bridge
  addr <bridge> <mac>      set the bridge hardware address
  up <bridge>              bring a bridge administratively up
  down <bridge>            bring a bridge administratively down
  list                     show bridges and their ports
  help                     show this help
  quit                     tear down and exit";

/// Run the console loop until EOF or `quit`
pub fn run(registry: &mut Registry) -> Result<()> {
    println!("brigade console; type 'help' for commands");

    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("brigade> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let args: Vec<&str> = line.split_whitespace().collect();
        if args.is_empty() {
            continue;
        }

        match dispatch(registry, &args) {
            Ok(true) => break,
            Ok(false) => {}
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    Ok(())
}

/// Execute one command; returns true when the session should end
fn dispatch(registry: &mut Registry, args: &[&str]) -> Result<bool> {
    match args {
        ["help"] => println!("{HELP}"),
        ["list"] => list(registry),
        ["quit"] | ["exit"] => return Ok(true),

        ["iface", name] => {
            let iface = registry
                .stack()
                .register_interface(IfaceKind::Ethernet, name)?;
            println!("registered {} (index {})", iface.name(), iface.index());
        }

        ["attach", bridge, iface] => {
            let id = resolve_bridge(registry, bridge)?;
            let iface = resolve_iface(registry, iface)?;
            registry.attach(id, &iface)?;
            println!("attached {} to {}", iface.name(), crate::registry::bridge_name(id));
        }

        ["detach", bridge, iface] => {
            let id = resolve_bridge(registry, bridge)?;
            let iface = resolve_iface(registry, iface)?;
            registry.detach(id, &iface)?;
            println!("detached {}", iface.name());
        }

        ["addr", bridge, mac] => {
            let id = resolve_bridge(registry, bridge)?;
            let addr: HwAddr = mac.parse()?;
            registry.set_address(id, addr)?;
            println!("{} address set to {}", crate::registry::bridge_name(id), addr);
        }

        ["up", bridge] => {
            let id = resolve_bridge(registry, bridge)?;
            let stack = registry.stack().clone();
            if let Some(b) = registry.bridge(id) {
                b.open(stack.as_ref());
                println!("{} up", b.name());
            }
        }

        ["down", bridge] => {
            let id = resolve_bridge(registry, bridge)?;
            let stack = registry.stack().clone();
            if let Some(b) = registry.bridge(id) {
                b.stop(stack.as_ref());
                println!("{} down", b.name());
            }
        }

        _ => println!("unknown command; type 'help'"),
    }

    Ok(false)
}

fn list(registry: &Registry) {
    if registry.bridges().is_empty() {
        println!("no bridges");
        return;
    }
    for bridge in registry.bridges() {
        let state = if bridge.dev().is_admin_up() { "up" } else { "down" };
        let ports = bridge.port_names();
        let ports = if ports.is_empty() {
            "-".to_string()
        } else {
            ports.join(" ")
        };
        println!(
            "{:<8} id={} addr={} {:<4} ports: {}",
            bridge.name(),
            bridge.id(),
            bridge.addr(),
            state,
            ports
        );
    }
}

/// Accept a bridge by id ("0") or by interface name ("brig0")
fn resolve_bridge(registry: &Registry, token: &str) -> Result<usize> {
    if let Ok(id) = token.parse::<usize>() {
        if registry.bridge(id).is_some() {
            return Ok(id);
        }
    }
    registry
        .bridge_named(token)
        .map(|b| b.id())
        .ok_or_else(|| Error::UnknownBridge(token.to_string()))
}

fn resolve_iface(registry: &Registry, name: &str) -> Result<IfaceHandle> {
    registry
        .stack()
        .lookup(name)
        .ok_or_else(|| Error::InvalidInterface(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::MemStack;
    use std::sync::Arc;

    fn setup() -> Registry {
        let mut registry = Registry::new(Arc::new(MemStack::new()));
        registry.create_bridges(2);
        registry
    }

    #[test]
    fn test_resolve_bridge_by_id_and_name() {
        let registry = setup();
        assert_eq!(resolve_bridge(&registry, "1").unwrap(), 1);
        assert_eq!(resolve_bridge(&registry, "brig0").unwrap(), 0);
        assert!(resolve_bridge(&registry, "brig9").is_err());
        assert!(resolve_bridge(&registry, "9").is_err());
    }

    #[test]
    fn test_dispatch_iface_attach_detach() {
        let mut registry = setup();

        assert!(!dispatch(&mut registry, &["iface", "eth0"]).unwrap());
        assert!(!dispatch(&mut registry, &["attach", "brig0", "eth0"]).unwrap());
        assert_eq!(registry.bridge(0).unwrap().port_count(), 1);

        assert!(!dispatch(&mut registry, &["detach", "brig0", "eth0"]).unwrap());
        assert_eq!(registry.bridge(0).unwrap().port_count(), 0);
    }

    #[test]
    fn test_dispatch_addr() {
        let mut registry = setup();
        assert!(!dispatch(&mut registry, &["addr", "brig1", "02:42:00:00:00:99"]).unwrap());
        assert_eq!(
            registry.bridge(1).unwrap().addr().to_string(),
            "02:42:00:00:00:99"
        );
    }

    #[test]
    fn test_dispatch_quit() {
        let mut registry = setup();
        assert!(dispatch(&mut registry, &["quit"]).unwrap());
        assert!(dispatch(&mut registry, &["exit"]).unwrap());
    }

    #[test]
    fn test_dispatch_unknown_iface_errors() {
        let mut registry = setup();
        assert!(dispatch(&mut registry, &["attach", "brig0", "ghost"]).is_err());
    }
}
