// crates/cm_cli/src/render.rs
//
// Plain-text table rendering of a ResultDoc. Reads only the document, so the
// table and the JSON output can never disagree.

use std::fmt::{self, Write};

use cm_pipeline::build_result::{CoalitionEntry, GroupBlock, ResultDoc, ValidationBlock};

pub fn render_table(doc: &ResultDoc) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_table(&mut out, doc)?;
    Ok(out)
}

fn write_table(out: &mut String, doc: &ResultDoc) -> fmt::Result {
    let b = &doc.body;
    let app = &b.apportionment;

    writeln!(out, "{}", b.election)?;
    writeln!(
        out,
        "{} seats, method {}, {} votes cast",
        app.total_seats, app.method, app.total_votes
    )?;
    writeln!(out)?;
    writeln!(out, "{:<10} {:>12} {:>7} {:>6} {:>7}", "Party", "Votes", "Vote%", "Seats", "Seat%")?;
    for p in &app.parties {
        writeln!(
            out,
            "{:<10} {:>12} {:>7.2} {:>6} {:>7.2}",
            p.abbreviation, p.votes, p.vote_share_pct, p.seats, p.seat_share_pct
        )?;
    }

    if let Some(c) = &b.coalitions {
        writeln!(out)?;
        writeln!(
            out,
            "Coalitions (majority {}, floor {}, up to {} parties): {} viable, {} minority, {} blocked, {} single-party",
            c.majority_threshold,
            c.minority_floor,
            c.max_coalition_size,
            c.viable.total,
            c.minority.total,
            c.blocked.total,
            c.single_party.total
        )?;
        if let Some(e) = &c.most_compatible {
            writeln!(out, "Most compatible: {}", summary(e))?;
        }
        if let Some(e) = &c.most_stable {
            writeln!(out, "Most stable:     {}", summary(e))?;
        }
        write_group(out, "Viable", &c.viable)?;
        write_group(out, "Single party", &c.single_party)?;
        write_group(out, "Minority", &c.minority)?;
        write_group(out, "Blocked", &c.blocked)?;
        writeln!(
            out,
            "\nSearch: {} parties, {} subsets examined, {} pruned, {} reported",
            c.stats.candidates, c.stats.examined, c.stats.pruned, c.stats.reported
        )?;
    }

    if let Some(v) = &b.validation {
        write_validation(out, v)?;
    }

    writeln!(out, "\nOutcome: {} ({})", b.label.value.as_str(), b.label.reason)?;
    writeln!(out, "Result:  {}", doc.id)
}

fn summary(e: &CoalitionEntry) -> String {
    format!(
        "{} ({} seats, compatibility {:.3}, stability {:.3})",
        e.names.join("+"),
        e.seats,
        e.compatibility,
        e.stability
    )
}

fn write_group(out: &mut String, title: &str, g: &GroupBlock) -> fmt::Result {
    if g.total == 0 {
        return Ok(());
    }
    writeln!(out, "\n{title} ({} of {}):", g.listed.len(), g.total)?;
    writeln!(out, "  {:>3}  {:<40} {:>5} {:>7} {:>7}", "#", "Members", "Seats", "Compat", "Stab")?;
    for (i, e) in g.listed.iter().enumerate() {
        writeln!(
            out,
            "  {:>3}  {:<40} {:>5} {:>7.3} {:>7.3}",
            i + 1,
            e.names.join("+"),
            e.seats,
            e.compatibility,
            e.stability
        )?;
        for r in &e.red_lines {
            writeln!(out, "         ! {r}")?;
        }
    }
    Ok(())
}

fn write_validation(out: &mut String, v: &ValidationBlock) -> fmt::Result {
    writeln!(out, "\nReference: {}", v.reference)?;
    writeln!(
        out,
        "  seats: {:.1}% ({} of {} exact, total error {})",
        v.seat_accuracy_pct, v.exact_matches, v.compared, v.total_abs_error
    )?;
    for m in &v.mismatches {
        writeln!(out, "    {}: expected {}, got {}", m.party, m.expected, m.actual)?;
    }
    if let Some(c) = &v.coalition {
        let rank = |r: Option<usize>| r.map_or_else(|| "-".to_string(), |r| r.to_string());
        writeln!(
            out,
            "  coalition {}: {}, compatibility rank {}, stability rank {}, {:.1}%",
            c.name,
            c.group.as_deref().unwrap_or("not enumerated"),
            rank(c.compatibility_rank),
            rank(c.stability_rank),
            c.accuracy_pct
        )?;
    }
    writeln!(out, "  overall: {:.1}%", v.overall_accuracy_pct)
}
