//! Generic CRUD handler shared by `sessions` and `practices`.
//!
//! Everything entity-specific comes from the `Entity` metadata, except
//! the table row layout which each entity module supplies through
//! [`Listing`].

use chrono::Local;
use tabled::Tabled;

use practrack_core::{
    Controller, ControllerConfig, Entity, EntityForm, EntityId, FieldKind, ListParams,
    sparse_entity,
};

use crate::cli::{EntityCommand, FieldArgs, GlobalOpts, ListArgs};
use crate::error::CliError;
use crate::output;

use super::util;

/// Table layout for an entity's list output.
pub trait Listing: Entity {
    type Row: Tabled;

    fn row(&self) -> Self::Row;
}

pub async fn handle<E: Listing>(
    config: ControllerConfig,
    command: EntityCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match command {
        EntityCommand::List(args) => {
            let params = list_params(&args);
            let ndjson = args.ndjson;
            let items = Controller::oneshot(config, move |c| async move {
                if ndjson {
                    c.list_ndjson::<E>(&params).await
                } else {
                    c.list::<E>(&params).await
                }
            })
            .await?;

            let out = output::render_list(
                &global.output,
                &items,
                |e| e.row(),
                |e| id_text(e.as_ref()),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        EntityCommand::Get { id } => {
            let id = EntityId::new(id);
            let entity =
                Controller::oneshot(config, move |c| async move { c.get_one::<E>(id).await })
                    .await?;
            print_single(&entity, global)
        }

        EntityCommand::Create(fields) => {
            let assignments = resolve_assignments::<E>(&fields)?;
            let saved = Controller::oneshot(config, move |c| async move {
                let mut form = EntityForm::<E>::create(&Local::now());
                clear_dates(&mut form);
                apply(&mut form, &assignments);
                c.preload_references::<E>().await?;
                c.save(&mut form, &Local).await
            })
            .await?;

            if !global.quiet {
                eprintln!("{} {} created", E::KIND.label(), id_text(&saved));
            }
            print_single(&saved, global)
        }

        EntityCommand::Update { id, fields } => {
            let id = EntityId::new(id);
            let assignments = resolve_assignments::<E>(&fields)?;
            let saved = Controller::oneshot(config, move |c| async move {
                let current = c.get_one::<E>(id).await?;
                let mut form = EntityForm::edit(id, &current, &Local);
                apply(&mut form, &assignments);
                c.preload_references::<E>().await?;
                c.save(&mut form, &Local).await
            })
            .await?;

            if !global.quiet {
                eprintln!("{} {id} updated", E::KIND.label());
            }
            print_single(&saved, global)
        }

        EntityCommand::Patch { id, fields } => {
            let id = EntityId::new(id);
            let assignments = resolve_assignments::<E>(&fields)?;
            if assignments.is_empty() {
                return Err(CliError::Validation {
                    field: "set".into(),
                    reason: "nothing to change; pass at least one --set FIELD=VALUE".into(),
                });
            }
            let pairs: Vec<(&str, &str)> = assignments
                .iter()
                .map(|(name, value)| (*name, value.as_str()))
                .collect();
            let patch: E = sparse_entity(id, &pairs, &Local)?;

            let saved =
                Controller::oneshot(config, move |c| async move { c.partial_update(patch).await })
                    .await?;

            if !global.quiet {
                eprintln!("{} {id} patched", E::KIND.label());
            }
            print_single(&saved, global)
        }

        EntityCommand::Delete { id } => {
            let id = EntityId::new(id);
            let prompt = format!("Are you sure you want to delete {} {id}?", E::KIND.label());
            if !util::confirm(&prompt, global.yes, "delete")? {
                return Ok(());
            }

            Controller::oneshot(config, move |c| async move { c.delete::<E>(id).await }).await?;

            if !global.quiet {
                eprintln!("{} {id} deleted", E::KIND.label());
            }
            Ok(())
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn list_params(args: &ListArgs) -> ListParams {
    let mut params = ListParams::default();
    if let Some(page) = args.page {
        params = params.page(page, args.size);
    }
    for clause in &args.sort {
        params = params.sorted_by(clause.clone());
    }
    params
}

fn id_text<E: Entity>(entity: &E) -> String {
    entity
        .entity_id()
        .map(|id| id.to_string())
        .unwrap_or_default()
}

/// Map user-typed field names onto wire names. Matching ignores case,
/// `-` and `_`, and also accepts the field label ("Practice Session").
fn resolve_assignments<E: Entity>(
    fields: &FieldArgs,
) -> Result<Vec<(&'static str, String)>, CliError> {
    fields
        .assignments
        .iter()
        .map(|(name, value)| {
            let key = normalize(name);
            E::FIELDS
                .iter()
                .find(|f| normalize(f.name) == key || normalize(f.label) == key)
                .map(|f| (f.name, value.clone()))
                .ok_or_else(|| CliError::Validation {
                    field: name.clone(),
                    reason: format!(
                        "unknown {} field, expected one of: {}",
                        E::KIND.label(),
                        E::FIELDS
                            .iter()
                            .map(|f| f.name)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                })
        })
        .collect()
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Dates are only sent when given on the command line.
fn clear_dates<E: Entity>(form: &mut EntityForm<E>) {
    for (index, field) in E::FIELDS.iter().enumerate() {
        if field.kind == FieldKind::DateTime {
            form.set_value(index, "");
        }
    }
}

fn apply<E: Entity>(form: &mut EntityForm<E>, assignments: &[(&'static str, String)]) {
    for (name, value) in assignments {
        form.set_named(name, value.as_str());
    }
}

fn print_single<E: Entity>(entity: &E, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let out = output::render_single(&global.output, entity, |e| detail(e, color), id_text::<E>)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Key/value detail view, one field per line.
fn detail<E: Entity>(entity: &E, color: bool) -> String {
    let width = E::FIELDS
        .iter()
        .map(|f| f.label.len())
        .max()
        .unwrap_or(0)
        .max("ID".len());

    let mut lines = vec![format!(
        "{}  {}",
        output::label(&format!("{:<width$}", "ID"), color),
        id_text(entity)
    )];
    for field in E::FIELDS {
        lines.push(format!(
            "{}  {}",
            output::label(&format!("{:<width$}", field.label), color),
            entity.field(field.name).display(&Local)
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use practrack_core::{Practice, PracticeSession};

    use super::*;

    fn args(pairs: &[(&str, &str)]) -> FieldArgs {
        FieldArgs {
            assignments: pairs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        }
    }

    #[test]
    fn field_names_accept_any_case_style() {
        let resolved = resolve_assignments::<Practice>(&args(&[
            ("problem-name", "two-sum"),
            ("problem_link", "https://example.com"),
            ("Practice Session", "3"),
        ]))
        .unwrap();
        assert_eq!(
            resolved,
            vec![
                ("problemName", "two-sum".to_owned()),
                ("problemLink", "https://example.com".to_owned()),
                ("practiceSession", "3".to_owned()),
            ]
        );
    }

    #[test]
    fn unknown_field_lists_valid_names() {
        let err = resolve_assignments::<PracticeSession>(&args(&[("colour", "red")])).unwrap_err();
        assert!(matches!(err, CliError::Validation { ref reason, .. } if reason.contains("start, end")));
    }

    #[test]
    fn create_form_leaves_dates_blank() {
        let mut form = EntityForm::<PracticeSession>::create(&Local::now());
        clear_dates(&mut form);
        apply(&mut form, &[("end", "2022-09-04T14:50".to_owned())]);
        assert_eq!(form.value_of("start"), Some(""));
        assert_eq!(form.value_of("end"), Some("2022-09-04T14:50"));
    }

    #[test]
    fn list_params_page_and_sort() {
        let params = list_params(&ListArgs {
            sort: vec!["id,desc".into()],
            page: Some(2),
            size: 10,
            ndjson: false,
        });
        assert_eq!(params, ListParams::default().page(2, 10).sorted_by("id,desc"));
    }

    #[test]
    fn detail_lists_every_field() {
        let practice = Practice {
            id: Some(5),
            problem_name: "two-sum".into(),
            ..Practice::default()
        };
        let text = detail(&practice, false);
        assert!(text.starts_with("ID"));
        assert!(text.contains("Problem Name"));
        assert!(text.contains("two-sum"));
        assert_eq!(text.lines().count(), Practice::FIELDS.len() + 1);
    }
}
