use crate::cli::CondoCommand;
use chrono::Utc;
use clap::{Args, Subcommand};
use condo_inspect::app::InspectionApp;
use condo_inspect::config::ReportConfig;
use condo_inspect::domain::{Condominium, Inspection, InspectionStatus, RecordId};
use condo_inspect::error::AppError;
use condo_inspect::registry::CondominiumDraft;
use condo_inspect::report::{share_report, ReportExporter, ShareOutcome, SharePayload, ShareTarget};
use condo_inspect::wizard::{encode_data_url, InspectionWizard, WizardAdvance, WizardError};
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Default)]
pub(crate) struct CondoFields {
    /// Condominium name
    #[arg(long)]
    pub(crate) name: Option<String>,
    /// Street address
    #[arg(long)]
    pub(crate) address: Option<String>,
    /// Tower or block (empty string clears it)
    #[arg(long)]
    pub(crate) tower: Option<String>,
    /// Free-form notes (empty string clears them)
    #[arg(long)]
    pub(crate) notes: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct AreaEdits {
    /// Area name to append, repeat for several
    #[arg(long)]
    pub(crate) add_area: Vec<String>,
    /// Area id or exact name to remove, repeat for several
    #[arg(long)]
    pub(crate) remove_area: Vec<String>,
}

#[derive(Args, Debug)]
pub(crate) struct InspectArgs {
    /// Condominium identifier
    pub(crate) condo_id: String,
}

#[derive(Subcommand, Debug)]
pub(crate) enum HistoryCommand {
    /// List completed inspections, most recent first
    List {
        /// Case-insensitive condominium name filter
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show one inspection in full
    Show {
        /// Inspection identifier
        id: String,
    },
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Inspection identifier
    pub(crate) id: String,
    /// Directory the PDF is written to (defaults to the current directory)
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}

const WIZARD_HELP: &str = "Comandos: [enter] avançar | c conforme | n não conforme | \
o <texto> observação | f <arquivo> foto | r <nº> remover foto | p voltar | q cancelar";

pub(crate) fn run_condo<W: Write>(
    app: &mut InspectionApp,
    command: CondoCommand,
    out: &mut W,
) -> Result<(), AppError> {
    match command {
        CondoCommand::List => {
            let summaries = app.condominium_summaries();
            if summaries.is_empty() {
                writeln!(out, "Nenhum condomínio cadastrado.")?;
            }
            for summary in summaries {
                let tower = summary
                    .tower
                    .map(|tower| format!(" ({tower})"))
                    .unwrap_or_default();
                writeln!(
                    out,
                    "{}  {}{tower} | {} | {} áreas",
                    summary.id, summary.name, summary.address, summary.area_count
                )?;
            }
        }
        CondoCommand::Add { fields, areas } => {
            let mut draft = CondominiumDraft::new(
                fields.name.unwrap_or_default(),
                fields.address.unwrap_or_default(),
            );
            draft.tower = fields.tower;
            draft.notes = fields.notes;
            for area in &areas {
                draft.add_area(area);
            }
            let created = app.create_condominium(draft)?;
            writeln!(out, "Condomínio cadastrado: {}", created.id)?;
            render_condominium(&created, out)?;
        }
        CondoCommand::Edit { id, fields, areas } => {
            let id = RecordId::from(id);
            let mut draft = app.edit_draft(&id)?;
            apply_fields(&mut draft, fields);
            for target in &areas.remove_area {
                let matched = draft
                    .areas
                    .iter()
                    .find(|area| area.id.as_str() == target.as_str() || area.name == *target)
                    .map(|area| area.id.clone());
                match matched {
                    Some(area_id) => {
                        draft.remove_area(&area_id);
                    }
                    None => writeln!(out, "Área não encontrada: {target}")?,
                }
            }
            for name in &areas.add_area {
                draft.add_area(name);
            }
            let updated = app.update_condominium(&id, draft)?;
            writeln!(out, "Condomínio atualizado.")?;
            render_condominium(&updated, out)?;
        }
        CondoCommand::Remove { id, yes } => {
            let id = RecordId::from(id);
            if !yes {
                let condo = app.condominium(&id)?;
                writeln!(
                    out,
                    "Tem certeza que deseja excluir {}? Repita o comando com --yes para confirmar.",
                    condo.name
                )?;
                return Ok(());
            }
            let removed = app.delete_condominium(&id)?;
            writeln!(out, "Condomínio removido: {}", removed.name)?;
        }
        CondoCommand::Show { id } => {
            let condo = app.condominium(&RecordId::from(id))?;
            render_condominium(condo, out)?;
        }
    }
    Ok(())
}

fn apply_fields(draft: &mut CondominiumDraft, fields: CondoFields) {
    if let Some(name) = fields.name {
        draft.name = name;
    }
    if let Some(address) = fields.address {
        draft.address = address;
    }
    if let Some(tower) = fields.tower {
        draft.tower = Some(tower);
    }
    if let Some(notes) = fields.notes {
        draft.notes = Some(notes);
    }
}

fn render_condominium<W: Write>(condo: &Condominium, out: &mut W) -> Result<(), AppError> {
    writeln!(out, "{} | {}", condo.name, condo.address)?;
    if let Some(tower) = &condo.tower {
        writeln!(out, "Torre/Bloco: {tower}")?;
    }
    if let Some(notes) = &condo.notes {
        writeln!(out, "Observações: {notes}")?;
    }
    writeln!(out, "Áreas ({}):", condo.areas.len())?;
    for area in &condo.areas {
        writeln!(out, "  - {} [{}]", area.name, area.id)?;
    }
    Ok(())
}

enum WizardInput {
    Next,
    Prev,
    Status(InspectionStatus),
    Notes(String),
    Photo(PathBuf),
    RemovePhoto(usize),
    Cancel,
    Help,
}

fn parse_input(line: &str) -> WizardInput {
    let line = line.trim();
    if line.is_empty() {
        return WizardInput::Next;
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    match verb {
        "p" => WizardInput::Prev,
        "q" => WizardInput::Cancel,
        "o" => WizardInput::Notes(rest.to_string()),
        "f" if !rest.is_empty() => WizardInput::Photo(PathBuf::from(rest)),
        "r" => match rest.parse::<usize>() {
            Ok(position) if position > 0 => WizardInput::RemovePhoto(position - 1),
            _ => WizardInput::Help,
        },
        _ => InspectionStatus::parse(line)
            .map(WizardInput::Status)
            .unwrap_or(WizardInput::Help),
    }
}

/// Interactive wizard. Returns the archived inspection id, or `None` when
/// cancelled or the input ends first.
pub(crate) fn run_inspection<R: BufRead, W: Write>(
    app: &mut InspectionApp,
    condo_id: &str,
    mut input: R,
    out: &mut W,
) -> Result<Option<RecordId>, AppError> {
    let mut wizard = app.start_inspection(&RecordId::from(condo_id))?;
    writeln!(out, "Vistoria: {}", wizard.condominium_name())?;
    writeln!(out, "{WIZARD_HELP}")?;

    loop {
        render_step(&wizard, out)?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out, "Vistoria cancelada.")?;
            return Ok(None);
        }

        match parse_input(&line) {
            WizardInput::Next => match wizard.next(app.inspector(), Utc::now()) {
                WizardAdvance::Continue(next) => wizard = next,
                WizardAdvance::Finished(inspection) => {
                    let archived = app.record_inspection(inspection)?;
                    writeln!(
                        out,
                        "Vistoria finalizada: {} ({} não conformes)",
                        archived.id,
                        archived.non_conforming_count()
                    )?;
                    return Ok(Some(archived.id.clone()));
                }
            },
            WizardInput::Prev => {
                if !wizard.prev() {
                    writeln!(out, "Já está no primeiro item.")?;
                }
            }
            WizardInput::Status(status) => wizard.set_status(status),
            WizardInput::Notes(notes) => wizard.set_notes(notes),
            WizardInput::Photo(path) => attach_photo_file(&mut wizard, &path, out)?,
            WizardInput::RemovePhoto(index) => {
                if wizard.remove_photo(index).is_none() {
                    writeln!(out, "Foto {} não existe.", index + 1)?;
                }
            }
            WizardInput::Cancel => {
                writeln!(out, "Vistoria cancelada.")?;
                return Ok(None);
            }
            WizardInput::Help => writeln!(out, "{WIZARD_HELP}")?,
        }
    }
}

fn render_step<W: Write>(wizard: &InspectionWizard, out: &mut W) -> Result<(), AppError> {
    let progress = wizard.progress();
    let area = wizard.current();
    writeln!(
        out,
        "\n[{}/{}] {:.0}% {} | {} | fotos {}",
        progress.step,
        progress.total,
        progress.percent,
        area.area_name,
        area.status,
        area.photos.len()
    )?;
    if !area.notes.is_empty() {
        writeln!(out, "Observação: {}", area.notes)?;
    }
    write!(out, "{} > ", progress.primary_action)?;
    out.flush()?;
    Ok(())
}

fn attach_photo_file<W: Write>(
    wizard: &mut InspectionWizard,
    path: &Path,
    out: &mut W,
) -> Result<(), AppError> {
    let guessed = mime_guess::from_path(path).first();
    if let Some(mime) = &guessed {
        if mime.type_().as_str() != "image" {
            writeln!(out, "Arquivo ignorado (não é imagem): {}", path.display())?;
            return Ok(());
        }
    }

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            writeln!(out, "Não foi possível ler {}: {err}", path.display())?;
            return Ok(());
        }
    };
    let Some(data_url) = encode_data_url(&bytes) else {
        writeln!(out, "Arquivo ignorado (imagem ilegível): {}", path.display())?;
        return Ok(());
    };

    match wizard.add_photo(data_url) {
        Ok(()) => writeln!(out, "Foto adicionada.")?,
        Err(WizardError::PhotoLimitReached) => {
            writeln!(out, "{}", WizardError::PhotoLimitReached)?
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

pub(crate) fn run_history<W: Write>(
    app: &InspectionApp,
    command: HistoryCommand,
    out: &mut W,
) -> Result<(), AppError> {
    match command {
        HistoryCommand::List { filter } => {
            let summaries = app.inspection_summaries(filter.as_deref().unwrap_or(""));
            if summaries.is_empty() {
                writeln!(out, "Nenhuma vistoria encontrada.")?;
            }
            for summary in summaries {
                writeln!(
                    out,
                    "{}  {} | {} | {} áreas | {} não conformes",
                    summary.id,
                    summary.date_label,
                    summary.condominium_name,
                    summary.area_count,
                    summary.non_conforming
                )?;
            }
        }
        HistoryCommand::Show { id } => {
            let inspection = app.inspection(&RecordId::from(id))?;
            render_inspection(inspection, out)?;
        }
    }
    Ok(())
}

fn render_inspection<W: Write>(inspection: &Inspection, out: &mut W) -> Result<(), AppError> {
    writeln!(out, "ID: #{}", inspection.id.as_str().to_uppercase())?;
    writeln!(out, "DATA: {}", inspection.date_label())?;
    writeln!(out, "Condomínio: {}", inspection.condominium_name)?;
    writeln!(out, "Responsável: {}", inspection.inspector)?;
    for area in &inspection.areas {
        writeln!(
            out,
            "  [{}] {} ({} fotos)",
            area.status,
            area.area_name,
            area.photos.len()
        )?;
        if !area.notes.trim().is_empty() {
            writeln!(out, "      {}", area.notes)?;
        }
    }
    Ok(())
}

pub(crate) fn run_export<W: Write>(
    app: &InspectionApp,
    exporter: &ReportExporter,
    args: ExportArgs,
    out: &mut W,
) -> Result<(), AppError> {
    let inspection = app.inspection(&RecordId::from(args.id))?;
    let report = exporter.export(inspection)?;
    let directory = args.out.unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&directory)?;
    let path = directory.join(&report.file_name);
    fs::write(&path, &report.bytes)?;
    writeln!(
        out,
        "Relatório salvo em {} ({} páginas)",
        path.display(),
        report.pages
    )?;
    Ok(())
}

pub(crate) fn run_share<W: Write>(
    app: &InspectionApp,
    target: &dyn ShareTarget,
    config: &ReportConfig,
    id: &str,
    out: &mut W,
) -> Result<(), AppError> {
    let inspection = app.inspection(&RecordId::from(id))?;
    let payload = SharePayload::for_inspection(inspection, config.detail_url(id));
    match share_report(target, payload, format!("export {id}"))? {
        ShareOutcome::Shared { payload } => {
            writeln!(out, "Compartilhado: {}", payload.title)?;
        }
        ShareOutcome::Guidance { message, download } => {
            writeln!(out, "{message}")?;
            writeln!(out, "Para baixar: {download}")?;
        }
    }
    Ok(())
}
