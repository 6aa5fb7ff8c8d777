//! Two `Link`s sharing an in-memory medium, exchanging unicast DATA
//! frames and printing what arrives. Run with:
//!
//!   cargo run --example two-node-chat --features mocks

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::info;

use mac80211_core::rf::mock::{Medium, MockRf};
use mac80211_core::{DeliveredFrame, Link};

const NODE_A: u16 = 0x0001;
const NODE_B: u16 = 0x0002;

fn main() -> anyhow::Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("error setting Ctrl-C handler");

    let log_cfg = simplelog::ConfigBuilder::new().build();
    let _ = simplelog::SimpleLogger::init(simplelog::LevelFilter::Info, log_cfg);

    info!("starting two-node-chat");

    let medium = Medium::new();
    let a = Link::new(MockRf::new(&medium), NODE_A)?;
    let b = Link::new(MockRf::new(&medium), NODE_B)?;

    let reader = {
        thread::spawn(move || {
            let mut out = DeliveredFrame {
                dest_addr: 0,
                src_addr: 0,
                payload: Vec::new(),
            };
            loop {
                let len = b.recv(&mut out);
                if len < 0 {
                    break;
                }
                info!(
                    "B received {} bytes from {:#06x}: {:?}",
                    len,
                    out.src_addr,
                    String::from_utf8_lossy(&out.payload)
                );
            }
        })
    };

    let messages = ["hello", "from", "node", "A"];
    for msg in messages {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        a.send(NODE_B, msg.as_bytes(), msg.len() as i32);
        thread::sleep(Duration::from_millis(500));
        info!("A status: {}", a.status());
    }

    drop(reader);
    Ok(())
}
