use anyhow::Context;

use crate::engine::provider::DecisionRequest;
use crate::model::narrative_event::EventKind;

/// Formats provider prompts. Text only: no parsing, no networking.
pub struct PromptBuilder;

impl PromptBuilder {
    /// The standing directive sent as the system prompt on every call.
    pub fn system_directive() -> String {
        let mut prompt = String::new();

        push_role(&mut prompt);
        push_event_vocabulary(&mut prompt);
        push_arc_rules(&mut prompt);
        push_pacing_rules(&mut prompt);
        push_response_shape(&mut prompt);

        prompt
    }

    /// The per-call user message: a short framing line plus the request as JSON.
    pub fn user_message(request: &DecisionRequest) -> anyhow::Result<String> {
        let body = serde_json::to_string_pretty(request).context("serializing decision request")?;

        let mut prompt = String::new();
        push_situation_header(&mut prompt, request);
        prompt.push_str("STATE:\n");
        prompt.push_str(&body);
        prompt.push_str("\n\n");
        push_reminder(&mut prompt, request);

        Ok(prompt)
    }
}

fn push_role(prompt: &mut String) {
    prompt.push_str(
        "You are the storyteller for a colony simulation. You decide what happens next.\n\
You plan multi-event narrative arcs and standalone scattered events, and you set the pacing\n\
of the game's own event timers. The engine enforces hard limits on your plan; anything it\n\
cannot fire is replaced or skipped, so plan for what the colony can actually experience.\n\n",
    );
}

fn push_event_vocabulary(prompt: &mut String) {
    let names = |filter: fn(&EventKind) -> bool| -> String {
        EventKind::all_known()
            .iter()
            .filter(|k| filter(k))
            .map(EventKind::def_name)
            .collect::<Vec<_>>()
            .join(", ")
    };

    prompt.push_str("EVENT TYPES (use these exact names):\n");
    prompt.push_str(&format!("- Major threats: {}\n", names(EventKind::is_major_threat)));
    prompt.push_str(&format!(
        "- Other threats: {}\n",
        names(|k| k.is_threat() && !k.is_major_threat() && !k.is_cooldown_class() && !k.is_weather())
    ));
    prompt.push_str(&format!("- Weather: {}\n", names(EventKind::is_weather)));
    prompt.push_str(&format!("- Diseases: {}\n", names(EventKind::is_cooldown_class)));
    prompt.push_str(&format!("- Arrivals and windfalls: {}\n", names(EventKind::is_positive)));
    prompt.push_str(&format!(
        "- Other: {}\n",
        names(|k| !k.is_threat() && !k.is_weather() && !k.is_positive() && !k.is_cooldown_class())
    ));
    prompt.push_str(
        "Raid subtypes: \"assault\", \"sapper\", \"siege\", \"drop_pods\".\n\
Factions: \"Pirate\", \"Tribal\", \"Mechanoid\" or null.\n\n",
    );
}

fn push_arc_rules(prompt: &mut String) {
    prompt.push_str(
        "ARC RULES:\n\
- An arc is 3-7 events with setup, escalation, climax and consequences.\n\
- Starting a new arc interrupts the active one and clears its remaining events.\n\
- Use \"continue_arc\" to let the active arc play out, \"skip\" to plan nothing.\n\
- Events inside an arc are spaced at least 2 hours apart; closer delays are pushed back.\n\
- At most one disease per arc. Diseases inside the cooldown window are dropped.\n\
- Read arc_history.instruction and follow it. Avoid the patterns it names.\n\
- Check current_queue and do_not_repeat before choosing types.\n\n",
    );
}

fn push_pacing_rules(prompt: &mut String) {
    prompt.push_str(
        "PACING:\n\
- next_call_days is 2-7 days. After starting an arc the next call waits at least 5 days.\n\
- adjust_timers changes the game's own cadence. Use 0 for a pair you want unchanged.\n\
- Minor events: 6-72 hours. Major events: 1-14 days. Narrative: 2-15 days.\n\
- Intensity is 0.3-1.5. delay_hours counts from now.\n\n",
    );
}

fn push_response_shape(prompt: &mut String) {
    prompt.push_str(
        "Respond ONLY with one JSON object, no markdown and no text outside it:\n\
{\n\
  \"arc\": {\n\
    \"decision\": \"start_arc\" or \"continue_arc\" or \"skip\",\n\
    \"arc_name\": \"<creative name>\",\n\
    \"events\": [\n\
      {\"delay_hours\": <hours>, \"type\": \"<event type>\", \"subtype\": <string or null>,\n\
       \"faction\": <string or null>, \"intensity\": <0.3 to 1.5>, \"note\": \"<role in the arc>\"}\n\
    ],\n\
    \"reasoning\": \"<arc logic>\"\n\
  },\n\
  \"scattered_events\": [ <same event shape> ],\n\
  \"next_call_days\": <2 to 7>,\n\
  \"adjust_timers\": {\n\
    \"minor_min_hours\": <number or 0>, \"minor_max_hours\": <number or 0>,\n\
    \"major_min_days\": <number or 0>, \"major_max_days\": <number or 0>,\n\
    \"narrative_min_days\": <number or 0>, \"narrative_max_days\": <number or 0>\n\
  },\n\
  \"posture\": {\"current_blend\": \"<label>\", \"reasoning\": \"<why>\", \"next_posture_hint\": \"<what would change it>\"},\n\
  \"reasoning\": \"<1-2 sentences>\"\n\
}\n",
    );
}

fn push_situation_header(prompt: &mut String, request: &DecisionRequest) {
    prompt.push_str(&format!(
        "REQUEST {} at day {}, hour {:.1}.\n",
        request.request_id, request.clock.day, request.clock.hour
    ));

    match &request.active_arc {
        Some(arc) => prompt.push_str(&format!(
            "Active arc: \"{}\" with {} event(s) still to fire.\n",
            arc.name, arc.remaining_events
        )),
        None => prompt.push_str("No arc is active.\n"),
    }

    if let Some(days) = request.days_since_last_arc {
        prompt.push_str(&format!("Last arc completed {days} day(s) ago.\n"));
    }

    if let Some(posture) = &request.last_posture {
        prompt.push_str(&format!("Your last posture: {}.\n", posture.label));
    }
    prompt.push('\n');
}

fn push_reminder(prompt: &mut String, request: &DecisionRequest) {
    prompt.push_str("REMINDER:\n");
    prompt.push_str(&format!("- {}\n", request.arc_history.instruction));
    prompt.push_str(&format!(
        "- Dominant pattern so far: {}\n",
        request.arc_history.dominant_pattern_text()
    ));
    if !request.difficulty.allow_threats {
        prompt.push_str("- Threats are disabled at this difficulty; they will not fire.\n");
    } else if !request.difficulty.allow_major_threats {
        prompt.push_str("- Major threats are disabled at this difficulty.\n");
    }
    prompt.push_str("- Respond with the JSON object only.\n");
}
