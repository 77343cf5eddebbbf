use canvas_actions::{
    find_file_block, ActionParser, CommandParams, MutationCommand, OperationKind, RootAlias,
};

const STREAM: &str = concat!(
    "[\"u_root\",\"_rootSlot_\",\"addChild\",{\"title\":\"页头\",\"ns\":\"mybricks.normal-pc.flex\",\"comId\":\"u_head1\",\"layout\":{\"width\":\"100%\",\"height\":64,\"margin\":\"0 0 12px\"},\"configs\":[{\"path\":\"Layout\",\"value\":{\"display\":\"flex\"}}]}]\n",
    "[\"u_head1\",\"content\",\"addChild\",{\"title\":\"Logo\",\"ns\":\"mybricks.normal-pc.image\",\"comId\":\"u_logo1\",\"layout\":{\"width\":48,\"height\":48}}]\n",
    "not json at all\n",
    "['u_logo1', ':root', 'doConfig', {path: 'Style/Frame', style: {background: 'linear-gradient(180deg,#000,#fff)'},}]\n",
    "[\"u_logo1\",\":root\",\"move\",{\"comId\":\"u_head1\",\"slotId\":\"content\",\"index\":0}]\n",
    "[\"u_old\",\":root\",\"remove\"]\n",
    "[\"\",\":root\",\"delete\",{}]\n",
    "[\"u_logo1\",\":root\",\"setLayout\",{\"width\":\"fit-content\",\"height\":48}]",
);

fn split_at_positions(source: &str, cuts: &[usize]) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0usize;
    for &cut in cuts {
        if cut > start && cut <= source.len() && source.is_char_boundary(cut) {
            out.push(source[start..cut].to_string());
            start = cut;
        }
    }
    if start < source.len() {
        out.push(source[start..].to_string());
    }
    out
}

fn incremental(alias: &RootAlias, chunks: &[String]) -> Vec<MutationCommand> {
    let mut parser = ActionParser::with_root_alias(alias.clone());
    let mut buffer = String::new();
    let mut out = Vec::new();
    for chunk in chunks {
        buffer.push_str(chunk);
        out.extend(parser.feed(&buffer));
    }
    out.extend(parser.finish(&buffer));
    out
}

#[test]
fn incremental_parse_matches_one_shot_parse() {
    let alias = RootAlias::default().with_container("u_root");
    let expected = ActionParser::with_root_alias(alias.clone()).finish(STREAM);
    assert_eq!(expected.len(), 6);

    let boundary_sets: [Vec<usize>; 5] = [
        (1..STREAM.len()).collect(),
        (0..STREAM.len()).step_by(7).collect(),
        (0..STREAM.len()).step_by(61).collect(),
        vec![STREAM.len() / 2],
        vec![STREAM.len() - 1],
    ];
    for cuts in boundary_sets {
        let chunks = split_at_positions(STREAM, &cuts);
        assert_eq!(incremental(&alias, &chunks), expected, "cuts: {cuts:?}");
    }
}

#[test]
fn every_line_is_emitted_at_most_once() {
    let alias = RootAlias::default();
    let chunks = split_at_positions(STREAM, &(0..STREAM.len()).step_by(3).collect::<Vec<_>>());
    let mut parser = ActionParser::with_root_alias(alias);
    let mut buffer = String::new();
    let mut emitted = Vec::new();
    for chunk in &chunks {
        buffer.push_str(chunk);
        emitted.extend(parser.feed(&buffer));
        emitted.extend(parser.feed(&buffer));
    }
    emitted.extend(parser.finish(&buffer));
    emitted.extend(parser.finish(&buffer));
    assert_eq!(emitted.len(), 6);
}

#[test]
fn stream_commands_are_normalized_in_order() {
    let alias = RootAlias::default().with_container("u_root");
    let cmds = ActionParser::with_root_alias(alias).finish(STREAM);
    let kinds = cmds.iter().map(MutationCommand::kind).collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            OperationKind::AddChild,
            OperationKind::AddChild,
            OperationKind::Configure,
            OperationKind::Move,
            OperationKind::Delete,
            OperationKind::SetLayout,
        ]
    );
    assert_eq!(cmds[0].target_id, "_root_");

    let header = serde_json::to_value(&cmds[0]).expect("serialize");
    assert_eq!(header["params"]["namespace"], "mybricks.normal-pc.flex");
    assert_eq!(header["params"]["layout"]["marginBottom"], "12px");
    assert_eq!(header["params"]["configs"][0]["value"]["flexDirection"], "column");

    let CommandParams::Configure(style) = &cmds[2].params else {
        panic!("expected doConfig");
    };
    let style = serde_json::to_value(style).expect("serialize");
    assert_eq!(style["style"]["backgroundColor"], "transparent");
    assert_eq!(style["style"]["backgroundImage"], "linear-gradient(180deg,#000,#fff)");
    assert!(style["style"].get("background").is_none());

    assert_eq!(
        serde_json::to_value(&cmds[3]).expect("serialize")["params"]["to"]["slotId"],
        "content"
    );
}

#[test]
fn actions_inside_a_fenced_block_stream_cleanly() {
    let response = format!("I'll build the header.\n```json file=\"actions.json\"\n{STREAM}\n```\n");
    let mut parser = ActionParser::new();
    let mut emitted = Vec::new();
    for end in (1..=response.len()).filter(|i| response.is_char_boundary(*i)).step_by(5) {
        if let Some(block) = find_file_block(&response[..end], "json") {
            emitted.extend(parser.feed(&block.body));
        }
    }
    let block = find_file_block(&response, "json").expect("block");
    assert!(block.complete);
    emitted.extend(parser.finish(&block.body));
    assert_eq!(emitted.len(), 6);
}
