use std::fmt::Write as FmtWrite;

use anyhow::Result;

use crate::graph::RosterGraph;
use crate::utils::escape_xml;
use crate::{MAX_ANCHOR_DISTANCE, NODE_RADIUS};

/// Render the current simulation state as an SVG document.
///
/// Safe to call on every tick: the output is a pure function of the graph
/// state (entity positions, anchors, palette, view transform) and nothing is
/// retained between calls. Empty and data-unavailable graphs render an
/// explanatory placeholder instead of failing.
pub fn render_svg(graph: &RosterGraph, background: &str) -> Result<String> {
    let viewport = graph.viewport();

    let mut svg = String::new();
    write!(
        svg,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="0 0 {:.0} {:.0}" font-family="Inter, system-ui, sans-serif">
  <rect width="100%" height="100%" fill="{}" />
"#,
        viewport.width,
        viewport.height,
        viewport.width,
        viewport.height,
        escape_xml(background)
    )?;

    if let Some(message) = graph.data_error() {
        write_placeholder(&mut svg, graph, "Roster data unavailable", Some(message))?;
        svg.push_str("</svg>\n");
        return Ok(svg);
    }

    if graph.entities().is_empty() {
        write_placeholder(&mut svg, graph, "No teams selected", None)?;
        svg.push_str("</svg>\n");
        return Ok(svg);
    }

    let transform = graph.transform();
    write!(
        svg,
        "  <g transform=\"translate({:.1} {:.1}) scale({:.3})\">\n",
        transform.translate.x, transform.translate.y, transform.scale
    )?;

    // Territory decoration per team, behind the nodes.
    for group in graph.groups() {
        let Some(anchor) = graph.anchors().effective(group) else {
            continue;
        };
        let colors = graph.palette().colors_for(group);
        write!(
            svg,
            "    <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{:.0}\" fill=\"{}\" fill-opacity=\"0.06\" stroke=\"{}\" stroke-opacity=\"0.25\" stroke-dasharray=\"6 8\" />\n",
            anchor.x, anchor.y, MAX_ANCHOR_DISTANCE, colors.primary, colors.primary
        )?;
        write!(
            svg,
            "    <text x=\"{:.1}\" y=\"{:.1}\" fill=\"{}\" fill-opacity=\"0.35\" font-size=\"28\" font-weight=\"700\" text-anchor=\"middle\" dominant-baseline=\"middle\">{}</text>\n",
            anchor.x,
            anchor.y,
            colors.primary,
            escape_xml(group)
        )?;
    }

    for entity in graph.entities() {
        let colors = graph.palette().colors_for(&entity.group);
        let detail = match entity.jersey {
            Some(jersey) => format!("{} · {} #{jersey}", entity.label, colors.display_name),
            None => format!("{} · {}", entity.label, colors.display_name),
        };
        write!(
            svg,
            "    <g class=\"node\" data-id=\"{}\">\n      <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{:.0}\" fill=\"{}\" stroke=\"#fff\" stroke-width=\"2\" opacity=\"0.9\"><title>{}</title></circle>\n      <text x=\"{:.1}\" y=\"{:.1}\" fill=\"#fff\" font-size=\"11\" font-weight=\"600\" text-anchor=\"middle\" dominant-baseline=\"middle\">{}</text>\n    </g>\n",
            escape_xml(&entity.id),
            entity.x,
            entity.y,
            NODE_RADIUS,
            colors.primary,
            escape_xml(&detail),
            entity.x,
            entity.y,
            escape_xml(&entity.label)
        )?;
    }

    svg.push_str("  </g>\n</svg>\n");
    Ok(svg)
}

fn write_placeholder(
    svg: &mut String,
    graph: &RosterGraph,
    headline: &str,
    detail: Option<&str>,
) -> Result<()> {
    let center = graph.viewport().center();
    write!(
        svg,
        "  <text x=\"{:.1}\" y=\"{:.1}\" fill=\"#6b7280\" font-size=\"18\" text-anchor=\"middle\" dominant-baseline=\"middle\">{}</text>\n",
        center.x,
        center.y,
        escape_xml(headline)
    )?;
    if let Some(detail) = detail {
        write!(
            svg,
            "  <text x=\"{:.1}\" y=\"{:.1}\" fill=\"#9ca3af\" font-size=\"13\" text-anchor=\"middle\" dominant-baseline=\"middle\">{}</text>\n",
            center.x,
            center.y + 26.0,
            escape_xml(detail)
        )?;
    }
    Ok(())
}
