// Archivo: render.rs
// Propósito: salida de texto de la CLI (listados, métricas, detalle).
use crate::commands::Session;
use idm::ROOT_SCOPE;
use std::collections::BTreeMap;
use std::fmt::Write;
use todo_domain::COMPLETION_DIMENSION;
use todo_workflow::{presets, WorkflowConfig, WorkflowMetrics};

/// Marca de la línea: `[x]`/`[ ]` con dimensión de compleción, si no el
/// valor de la primera dimensión declarada.
fn marker(config: &WorkflowConfig, statuses: &BTreeMap<String, String>) -> (String, Option<String>) {
    if config.dimension(COMPLETION_DIMENSION).is_some() {
        let done = statuses.get(COMPLETION_DIMENSION).map(|v| v == "done").unwrap_or(false);
        let mark = if done { "[x]" } else { "[ ]" };
        return (mark.to_string(), Some(COMPLETION_DIMENSION.to_string()));
    }
    match config.dimensions.first() {
        Some(dim) => {
            let value = statuses.get(&dim.name).map(String::as_str).unwrap_or("-");
            (format!("[{}]", value), Some(dim.name.clone()))
        }
        None => ("[ ]".to_string(), None),
    }
}

/// Resto de dimensiones como ` (dim: valor, ...)`.
fn extras(statuses: &BTreeMap<String, String>, skip: Option<&str>) -> String {
    let rest: Vec<String> = statuses.iter()
                                    .filter(|(dim, _)| Some(dim.as_str()) != skip)
                                    .map(|(dim, value)| format!("{}: {}", dim, value))
                                    .collect();
    if rest.is_empty() {
        String::new()
    } else {
        format!(" ({})", rest.join(", "))
    }
}

fn line(session: &Session, uid: &str, path: &str, depth: usize) -> anyhow::Result<String> {
    let workflow = session.workflow();
    let statuses = workflow.get_statuses(uid)?;
    let item = session.store().item(uid)?;
    let (mark, shown) = marker(workflow.config(), &statuses);
    Ok(format!("{}{}. {} {}{}\n",
               "  ".repeat(depth),
               path,
               mark,
               item.text(),
               extras(&statuses, shown.as_deref())))
}

fn walk(session: &Session, parent: &str, prefix: &str, depth: usize, context: &str, out: &mut String) -> anyhow::Result<()> {
    let children = session.workflow().get_children_in_context(parent, context)?;
    for (idx, uid) in children.iter().enumerate() {
        let path = if prefix.is_empty() {
            (idx + 1).to_string()
        } else {
            format!("{}.{}", prefix, idx + 1)
        };
        out.push_str(&line(session, uid, &path, depth)?);
        walk(session, uid, &path, depth + 1, context, out)?;
    }
    Ok(())
}

/// Árbol de items visibles en `context`, numerado dentro del contexto.
pub fn forest(session: &Session, context: &str) -> anyhow::Result<String> {
    let mut out = String::new();
    walk(session, ROOT_SCOPE, "", 0, context, &mut out)?;
    if out.is_empty() {
        log::info!("nothing visible in context '{}'", context);
    }
    Ok(out)
}

pub fn metrics(metrics: &WorkflowMetrics) -> String {
    let mut out = String::new();
    let scope = if metrics.scope == ROOT_SCOPE { "all items" } else { metrics.scope.as_str() };
    let _ = writeln!(out, "{}", scope);
    let _ = writeln!(out, "total: {}", metrics.total_items);
    for (dim, values) in &metrics.by_dimension {
        let counts: Vec<String> = values.iter().map(|(v, n)| format!("{}={}", v, n)).collect();
        let _ = writeln!(out, "{}: {}", dim, counts.join(" "));
    }
    if !metrics.by_context.is_empty() {
        let counts: Vec<String> = metrics.by_context.iter().map(|(c, n)| format!("{}={}", c, n)).collect();
        let _ = writeln!(out, "contexts: {}", counts.join(" "));
    }
    out
}

pub fn contexts(config: &WorkflowConfig) -> String {
    let mut out = String::new();
    for ctx in config.contexts() {
        let rules = config.visibility_rules(ctx);
        if rules.is_empty() {
            let _ = writeln!(out, "{}: everything", ctx);
            continue;
        }
        let parts: Vec<String> = rules.iter()
                                      .map(|r| {
                                          let mut part = r.dimension.clone();
                                          if !r.include.is_empty() {
                                              part.push_str(&format!(" in [{}]", r.include.join(", ")));
                                          }
                                          if !r.exclude.is_empty() {
                                              part.push_str(&format!(" not in [{}]", r.exclude.join(", ")));
                                          }
                                          part
                                      })
                                      .collect();
        let _ = writeln!(out, "{}: {}", ctx, parts.join(" and "));
    }
    out
}

/// Presets conocidos; `*` marca el configurado.
pub fn preset_list(current: &str) -> String {
    presets::names().into_iter()
                    .map(|name| {
                        let mark = if name == current { "*" } else { " " };
                        format!("{} {}\n", mark, name)
                    })
                    .collect()
}

/// Detalle de un item: uid, texto, padre, fecha y estados con las
/// transiciones permitidas desde cada valor.
pub fn item(session: &Session, uid: &str, path: &str) -> anyhow::Result<String> {
    let workflow = session.workflow();
    let item = session.store().item(uid)?;
    let mut out = String::new();
    let _ = writeln!(out, "{}  {}", path, item.text());
    let _ = writeln!(out, "uid: {}", item.uid());
    let _ = writeln!(out, "parent: {}", item.parent().unwrap_or(ROOT_SCOPE));
    let _ = writeln!(out, "modified: {}", item.modified().to_rfc3339());
    for (dim, value) in workflow.get_statuses(uid)? {
        let next = workflow.allowed_transitions(uid, &dim)?;
        if next.is_empty() {
            let _ = writeln!(out, "{}: {}", dim, value);
        } else {
            let _ = writeln!(out, "{}: {} (-> {})", dim, value, next.join(", "));
        }
    }
    Ok(out)
}
