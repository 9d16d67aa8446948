//! Nmap host normalization.
//!
//! Schema-aware folding of one `<host>` subtree into a compact record.
//! Only a fixed subset of the Nmap schema is normalized; unknown host
//! children are ignored by design. Fields are omitted, never
//! null-valued, when their source elements or attributes are absent.

use serde_json::{Map, Value};

use crate::parse::Element;

use super::Record;

/// The fixed record tag for nmap mode.
pub const HOST_TAG: &str = "host";

/// Service attributes carried through verbatim.
const SERVICE_ATTRS: [&str; 7] = [
    "name",
    "product",
    "version",
    "extrainfo",
    "tunnel",
    "method",
    "conf",
];

/// Folds a `<host>` subtree.
///
/// `coerce_numbers` switches numeric-looking fields (`portid`,
/// `uptime.seconds`) from strings to JSON numbers.
pub fn fold_host(host: &Element, coerce_numbers: bool) -> Record {
    let mut obj = Map::new();
    obj.insert("_tag".to_string(), Value::String(HOST_TAG.to_string()));

    copy_attr(&mut obj, host, "starttime");

    if let Some(state) = host.first_child("status").and_then(|s| s.attr("state")) {
        obj.insert("status".to_string(), Value::String(state.to_string()));
    }

    let addresses: Vec<Value> = host
        .children_named("address")
        .map(|address| {
            let mut m = Map::new();
            copy_attr(&mut m, address, "addr");
            copy_attr(&mut m, address, "addrtype");
            copy_attr(&mut m, address, "vendor");
            Value::Object(m)
        })
        .collect();
    insert_array(&mut obj, "addresses", addresses);

    if let Some(hostnames) = host.first_child("hostnames") {
        let names: Vec<Value> = hostnames
            .children_named("hostname")
            .map(|hostname| {
                let mut m = Map::new();
                copy_attr(&mut m, hostname, "name");
                copy_attr(&mut m, hostname, "type");
                Value::Object(m)
            })
            .collect();
        insert_array(&mut obj, "hostnames", names);
    }

    if let Some(os) = host.first_child("os") {
        let matches: Vec<Value> = os.children_named("osmatch").map(fold_osmatch).collect();
        insert_array(&mut obj, "osmatch", matches);
    }

    if let Some(ports) = host.first_child("ports") {
        let folded: Vec<Value> = ports
            .children_named("port")
            .map(|port| fold_port(port, coerce_numbers))
            .collect();
        insert_array(&mut obj, "ports", folded);
    }

    if let Some(hostscript) = host.first_child("hostscript") {
        let scripts: Vec<Value> = hostscript.children_named("script").map(fold_script).collect();
        insert_array(&mut obj, "hostscripts", scripts);
    }

    if let Some(uptime) = host.first_child("uptime") {
        let mut m = Map::new();
        if let Some(seconds) = uptime.attr("seconds") {
            m.insert("seconds".to_string(), num_or_str(seconds, coerce_numbers));
        }
        copy_attr(&mut m, uptime, "lastboot");
        if !m.is_empty() {
            obj.insert("uptime".to_string(), Value::Object(m));
        }
    }

    Record {
        tag: HOST_TAG.to_string(),
        body: Value::Object(obj),
    }
}

fn fold_port(port: &Element, coerce_numbers: bool) -> Value {
    let mut m = Map::new();
    copy_attr(&mut m, port, "protocol");
    if let Some(portid) = port.attr("portid") {
        m.insert("portid".to_string(), num_or_str(portid, coerce_numbers));
    }

    if let Some(state) = port.first_child("state") {
        copy_attr(&mut m, state, "state");
        copy_attr(&mut m, state, "reason");
    }

    if let Some(service) = port.first_child("service") {
        let mut svc = Map::new();
        for attr in SERVICE_ATTRS {
            copy_attr(&mut svc, service, attr);
        }
        let cpes: Vec<Value> = service
            .children_named("cpe")
            .filter_map(|cpe| {
                let text = cpe.trimmed_text();
                (!text.is_empty()).then(|| Value::String(text.to_string()))
            })
            .collect();
        insert_array(&mut svc, "cpe", cpes);
        if !svc.is_empty() {
            m.insert("service".to_string(), Value::Object(svc));
        }
    }

    let scripts: Vec<Value> = port.children_named("script").map(fold_script).collect();
    insert_array(&mut m, "scripts", scripts);

    Value::Object(m)
}

fn fold_osmatch(osmatch: &Element) -> Value {
    let mut m = Map::new();
    copy_attr(&mut m, osmatch, "name");
    copy_attr(&mut m, osmatch, "accuracy");
    let classes: Vec<Value> = osmatch
        .children_named("osclass")
        .map(|osclass| {
            let mut c = Map::new();
            for attr in ["type", "vendor", "osfamily", "osgen", "accuracy"] {
                copy_attr(&mut c, osclass, attr);
            }
            Value::Object(c)
        })
        .collect();
    insert_array(&mut m, "osclass", classes);
    Value::Object(m)
}

fn fold_script(script: &Element) -> Value {
    let mut m = Map::new();
    copy_attr(&mut m, script, "id");
    copy_attr(&mut m, script, "output");
    Value::Object(m)
}

fn copy_attr(target: &mut Map<String, Value>, element: &Element, name: &str) {
    if let Some(value) = element.attr(name) {
        target.insert(name.to_string(), Value::String(value.to_string()));
    }
}

fn insert_array(target: &mut Map<String, Value>, key: &str, items: Vec<Value>) {
    if !items.is_empty() {
        target.insert(key.to_string(), Value::Array(items));
    }
}

fn num_or_str(value: &str, coerce: bool) -> Value {
    if coerce {
        if let Ok(n) = value.parse::<i64>() {
            return Value::from(n);
        }
    }
    Value::String(value.to_string())
}
