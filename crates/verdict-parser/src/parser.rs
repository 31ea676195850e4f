//! DMN XML parser
//!
//! Event-driven parser over `quick_xml`. Elements are matched by local name
//! so both default-namespace documents and `dmn:`-prefixed ones parse the
//! same way. Unknown elements are skipped wholesale; missing optional
//! attributes become empty strings. The only post-parse fixup is filling in
//! the UNIQUE hit policy on decision tables that omit the attribute.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use verdict_core::model::{
    BusinessKnowledgeModel, Decision, DecisionTable, Definitions, ElementReference, Input,
    InputData, InputEntry, InputExpression, InputValues, InformationRequirement,
    LiteralExpression, Output, OutputEntry, OutputValues, Rule, Variable,
};

use crate::error::{ParseError, Result};

type XmlReader<'a> = Reader<&'a [u8]>;

/// DMN XML parser
#[derive(Debug, Default)]
pub struct DmnParser;

impl DmnParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a DMN document from raw bytes.
    pub fn parse_bytes(&self, data: &[u8]) -> Result<Definitions> {
        let text = std::str::from_utf8(data)?;
        self.parse_str(text)
    }

    /// Parse a DMN document from a string slice.
    pub fn parse_str(&self, xml: &str) -> Result<Definitions> {
        let mut reader = Reader::from_reader(xml.as_bytes());

        loop {
            match reader.read_event()? {
                Event::Start(e) if e.local_name().as_ref() == b"definitions" => {
                    let mut defs = parse_definitions(&mut reader, &e)?;
                    apply_defaults(&mut defs);
                    return Ok(defs);
                }
                Event::Empty(e) if e.local_name().as_ref() == b"definitions" => {
                    let mut defs = definitions_from_attrs(&e)?;
                    apply_defaults(&mut defs);
                    return Ok(defs);
                }
                Event::Start(e) | Event::Empty(e) => {
                    return Err(ParseError::Malformed(format!(
                        "expected <definitions> root element, found <{}>",
                        String::from_utf8_lossy(e.local_name().as_ref())
                    )));
                }
                Event::Eof => {
                    return Err(ParseError::Malformed(
                        "document has no <definitions> root element".to_string(),
                    ));
                }
                _ => {}
            }
        }
    }
}

/// Set the default hit policy on tables that omit the attribute.
fn apply_defaults(defs: &mut Definitions) {
    for decision in &mut defs.decisions {
        if let Some(table) = &mut decision.decision_table {
            if table.hit_policy.is_empty() {
                table.hit_policy = "UNIQUE".to_string();
            }
        }
    }
}

/// Fetch an attribute by local name, unescaped.
fn attr(e: &BytesStart, name: &str) -> Result<Option<String>> {
    for a in e.attributes() {
        let a = a.map_err(quick_xml::Error::InvalidAttr)?;
        if a.key.local_name().as_ref() == name.as_bytes() {
            return Ok(Some(a.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn attr_or_default(e: &BytesStart, name: &str) -> Result<String> {
    Ok(attr(e, name)?.unwrap_or_default())
}

/// Collect character data (text and CDATA) up to the matching end tag,
/// skipping any nested markup.
fn read_text(reader: &mut XmlReader, end: QName) -> Result<String> {
    let mut out = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(t) => out.push_str(&t.unescape()?),
            Event::CData(t) => out.push_str(&String::from_utf8_lossy(&t.into_inner())),
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(e) if e.name() == end => return Ok(out),
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }
}

fn unexpected_eof() -> ParseError {
    ParseError::Malformed("unexpected end of document".to_string())
}

fn definitions_from_attrs(e: &BytesStart) -> Result<Definitions> {
    Ok(Definitions {
        id: attr_or_default(e, "id")?,
        name: attr_or_default(e, "name")?,
        namespace: attr_or_default(e, "namespace")?,
        expression_language: attr(e, "expressionLanguage")?
            .unwrap_or_else(|| "FEEL".to_string()),
        ..Default::default()
    })
}

fn parse_definitions(reader: &mut XmlReader, start: &BytesStart) -> Result<Definitions> {
    let mut defs = definitions_from_attrs(start)?;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"decision" => defs.decisions.push(parse_decision(reader, &e)?),
                b"inputData" => defs.input_data.push(parse_input_data(reader, &e)?),
                b"businessKnowledgeModel" => {
                    defs.business_knowledge_models.push(bkm_from_attrs(&e)?);
                    reader.read_to_end(e.name())?;
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"inputData" => defs.input_data.push(input_data_from_attrs(&e)?),
                b"businessKnowledgeModel" => {
                    defs.business_knowledge_models.push(bkm_from_attrs(&e)?)
                }
                _ => {}
            },
            Event::End(_) => return Ok(defs),
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }
}

fn parse_decision(reader: &mut XmlReader, start: &BytesStart) -> Result<Decision> {
    let mut decision = Decision {
        id: attr_or_default(start, "id")?,
        name: attr_or_default(start, "name")?,
        ..Default::default()
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"variable" => {
                    decision.variable = Some(variable_from_attrs(&e)?);
                    reader.read_to_end(e.name())?;
                }
                b"informationRequirement" => {
                    decision
                        .information_requirements
                        .push(parse_information_requirement(reader, &e)?);
                }
                b"decisionTable" => {
                    decision.decision_table = Some(parse_decision_table(reader, &e)?);
                }
                b"literalExpression" => {
                    decision.literal_expression =
                        Some(parse_literal_expression(reader, &e)?);
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"variable" {
                    decision.variable = Some(variable_from_attrs(&e)?);
                }
            }
            Event::End(_) => return Ok(decision),
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }
}

fn variable_from_attrs(e: &BytesStart) -> Result<Variable> {
    Ok(Variable {
        id: attr_or_default(e, "id")?,
        name: attr_or_default(e, "name")?,
        type_ref: attr_or_default(e, "typeRef")?,
    })
}

fn bkm_from_attrs(e: &BytesStart) -> Result<BusinessKnowledgeModel> {
    Ok(BusinessKnowledgeModel {
        id: attr_or_default(e, "id")?,
        name: attr_or_default(e, "name")?,
    })
}

fn input_data_from_attrs(e: &BytesStart) -> Result<InputData> {
    Ok(InputData {
        id: attr_or_default(e, "id")?,
        name: attr_or_default(e, "name")?,
        variable: None,
    })
}

fn parse_input_data(reader: &mut XmlReader, start: &BytesStart) -> Result<InputData> {
    let mut input_data = input_data_from_attrs(start)?;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"variable" {
                    input_data.variable = Some(variable_from_attrs(&e)?);
                }
                reader.read_to_end(e.name())?;
            }
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"variable" {
                    input_data.variable = Some(variable_from_attrs(&e)?);
                }
            }
            Event::End(_) => return Ok(input_data),
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }
}

fn parse_information_requirement(
    reader: &mut XmlReader,
    start: &BytesStart,
) -> Result<InformationRequirement> {
    let mut requirement = InformationRequirement {
        id: attr_or_default(start, "id")?,
        ..Default::default()
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                match e.local_name().as_ref() {
                    b"requiredDecision" => {
                        requirement.required_decision = Some(reference_from_attrs(&e)?)
                    }
                    b"requiredInput" => {
                        requirement.required_input = Some(reference_from_attrs(&e)?)
                    }
                    _ => {}
                }
                reader.read_to_end(e.name())?;
            }
            Event::Empty(e) => match e.local_name().as_ref() {
                b"requiredDecision" => {
                    requirement.required_decision = Some(reference_from_attrs(&e)?)
                }
                b"requiredInput" => {
                    requirement.required_input = Some(reference_from_attrs(&e)?)
                }
                _ => {}
            },
            Event::End(_) => return Ok(requirement),
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }
}

fn reference_from_attrs(e: &BytesStart) -> Result<ElementReference> {
    Ok(ElementReference {
        href: attr_or_default(e, "href")?,
    })
}

fn parse_decision_table(reader: &mut XmlReader, start: &BytesStart) -> Result<DecisionTable> {
    let mut table = DecisionTable {
        id: attr_or_default(start, "id")?,
        hit_policy: attr_or_default(start, "hitPolicy")?,
        aggregation: attr_or_default(start, "aggregation")?,
        ..Default::default()
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"input" => table.inputs.push(parse_input(reader, &e)?),
                b"output" => table.outputs.push(parse_output(reader, &e)?),
                b"rule" => table.rules.push(parse_rule(reader, &e)?),
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"input" => table.inputs.push(input_from_attrs(&e)?),
                b"output" => table.outputs.push(output_from_attrs(&e)?),
                _ => {}
            },
            Event::End(_) => return Ok(table),
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }
}

fn input_from_attrs(e: &BytesStart) -> Result<Input> {
    Ok(Input {
        id: attr_or_default(e, "id")?,
        label: attr_or_default(e, "label")?,
        ..Default::default()
    })
}

fn parse_input(reader: &mut XmlReader, start: &BytesStart) -> Result<Input> {
    let mut input = input_from_attrs(start)?;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"inputExpression" => {
                    input.input_expression = parse_input_expression(reader, &e)?;
                }
                b"inputValues" => {
                    input.input_values = Some(InputValues {
                        text: parse_text_container(reader)?,
                    });
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"inputExpression" {
                    input.input_expression = InputExpression {
                        id: attr_or_default(&e, "id")?,
                        type_ref: attr_or_default(&e, "typeRef")?,
                        text: String::new(),
                    };
                }
            }
            Event::End(_) => return Ok(input),
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }
}

fn parse_input_expression(reader: &mut XmlReader, start: &BytesStart) -> Result<InputExpression> {
    Ok(InputExpression {
        id: attr_or_default(start, "id")?,
        type_ref: attr_or_default(start, "typeRef")?,
        text: parse_text_container(reader)?,
    })
}

/// Consume the children of an element expected to hold a single `<text>`
/// child, returning that text (empty when absent).
fn parse_text_container(reader: &mut XmlReader) -> Result<String> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"text" {
                    text = read_text(reader, e.name())?;
                } else {
                    reader.read_to_end(e.name())?;
                }
            }
            Event::End(_) => return Ok(text),
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }
}

fn output_from_attrs(e: &BytesStart) -> Result<Output> {
    Ok(Output {
        id: attr_or_default(e, "id")?,
        label: attr_or_default(e, "label")?,
        name: attr_or_default(e, "name")?,
        type_ref: attr_or_default(e, "typeRef")?,
        output_values: None,
    })
}

fn parse_output(reader: &mut XmlReader, start: &BytesStart) -> Result<Output> {
    let mut output = output_from_attrs(start)?;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"outputValues" {
                    output.output_values = Some(OutputValues {
                        text: parse_text_container(reader)?,
                    });
                } else {
                    reader.read_to_end(e.name())?;
                }
            }
            Event::End(_) => return Ok(output),
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }
}

fn parse_rule(reader: &mut XmlReader, start: &BytesStart) -> Result<Rule> {
    let mut rule = Rule {
        id: attr_or_default(start, "id")?,
        ..Default::default()
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"description" => rule.description = read_text(reader, e.name())?,
                b"inputEntry" => rule.input_entries.push(InputEntry {
                    id: attr_or_default(&e, "id")?,
                    text: parse_text_container(reader)?,
                }),
                b"outputEntry" => rule.output_entries.push(OutputEntry {
                    id: attr_or_default(&e, "id")?,
                    text: parse_text_container(reader)?,
                }),
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"inputEntry" => rule.input_entries.push(InputEntry {
                    id: attr_or_default(&e, "id")?,
                    text: String::new(),
                }),
                b"outputEntry" => rule.output_entries.push(OutputEntry {
                    id: attr_or_default(&e, "id")?,
                    text: String::new(),
                }),
                _ => {}
            },
            Event::End(_) => return Ok(rule),
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }
}

fn parse_literal_expression(
    reader: &mut XmlReader,
    start: &BytesStart,
) -> Result<LiteralExpression> {
    Ok(LiteralExpression {
        id: attr_or_default(start, "id")?,
        type_ref: attr_or_default(start, "typeRef")?,
        text: parse_text_container(reader)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<definitions xmlns="https://www.omg.org/spec/DMN/20191111/MODEL/"
             id="defs1" name="Age Check" namespace="http://example.com/dmn">
  <decision id="ageDecision" name="Age Category">
    <decisionTable id="table1" hitPolicy="UNIQUE">
      <input id="input1" label="Age">
        <inputExpression id="ie1" typeRef="number">
          <text>age</text>
        </inputExpression>
      </input>
      <output id="output1" name="category" typeRef="string"/>
      <rule id="rule1">
        <inputEntry id="entry1"><text>&lt; 18</text></inputEntry>
        <outputEntry id="out1"><text>"minor"</text></outputEntry>
      </rule>
      <rule id="rule2">
        <inputEntry id="entry2"><text>&gt;= 18</text></inputEntry>
        <outputEntry id="out2"><text>"adult"</text></outputEntry>
      </rule>
    </decisionTable>
  </decision>
</definitions>"#;

    #[test]
    fn test_parse_simple_table() {
        let defs = DmnParser::new().parse_str(SIMPLE).unwrap();

        assert_eq!(defs.id, "defs1");
        assert_eq!(defs.name, "Age Check");
        assert_eq!(defs.namespace, "http://example.com/dmn");
        assert_eq!(defs.expression_language, "FEEL");
        assert_eq!(defs.decisions.len(), 1);

        let table = defs.decisions[0].decision_table.as_ref().unwrap();
        assert_eq!(table.hit_policy, "UNIQUE");
        assert_eq!(table.inputs.len(), 1);
        assert_eq!(table.inputs[0].input_expression.text, "age");
        assert_eq!(table.outputs[0].name, "category");
        assert_eq!(table.rules.len(), 2);
        assert_eq!(table.rules[0].input_entries[0].text, "< 18");
        assert_eq!(table.rules[1].output_entries[0].text, "\"adult\"");
    }

    #[test]
    fn test_hit_policy_defaults_to_unique() {
        let xml = r#"<definitions id="d">
          <decision id="dec">
            <decisionTable>
              <output name="o"/>
            </decisionTable>
          </decision>
        </definitions>"#;

        let defs = DmnParser::new().parse_str(xml).unwrap();
        let table = defs.decisions[0].decision_table.as_ref().unwrap();
        assert_eq!(table.hit_policy, "UNIQUE");
    }

    #[test]
    fn test_namespace_prefixes_are_ignored() {
        let xml = r#"<dmn:definitions xmlns:dmn="https://www.omg.org/spec/DMN/20191111/MODEL/" id="defs1">
          <dmn:decision id="dec1" name="D">
            <dmn:decisionTable dmn:hitPolicy="FIRST">
              <dmn:output dmn:name="result"/>
            </dmn:decisionTable>
          </dmn:decision>
        </dmn:definitions>"#;

        let defs = DmnParser::new().parse_str(xml).unwrap();
        assert_eq!(defs.id, "defs1");
        let table = defs.decisions[0].decision_table.as_ref().unwrap();
        assert_eq!(table.hit_policy, "FIRST");
        assert_eq!(table.outputs[0].name, "result");
    }

    #[test]
    fn test_unknown_elements_are_skipped() {
        let xml = r#"<definitions id="d">
          <extensionElements><custom><deep>ignored</deep></custom></extensionElements>
          <decision id="dec">
            <annotation>note</annotation>
            <decisionTable><output name="o"/></decisionTable>
          </decision>
        </definitions>"#;

        let defs = DmnParser::new().parse_str(xml).unwrap();
        assert_eq!(defs.decisions.len(), 1);
        assert!(defs.decisions[0].decision_table.is_some());
    }

    #[test]
    fn test_cdata_text() {
        let xml = r#"<definitions id="d">
          <decision id="dec">
            <decisionTable>
              <input><inputExpression><text><![CDATA[amount]]></text></inputExpression></input>
              <output name="o"/>
              <rule>
                <inputEntry><text><![CDATA[< 100]]></text></inputEntry>
                <outputEntry><text>"low"</text></outputEntry>
              </rule>
            </decisionTable>
          </decision>
        </definitions>"#;

        let defs = DmnParser::new().parse_str(xml).unwrap();
        let table = defs.decisions[0].decision_table.as_ref().unwrap();
        assert_eq!(table.inputs[0].input_expression.text, "amount");
        assert_eq!(table.rules[0].input_entries[0].text, "< 100");
    }

    #[test]
    fn test_information_requirements() {
        let xml = r##"<definitions id="d">
          <decision id="a">
            <informationRequirement id="ir1">
              <requiredDecision href="#b"/>
            </informationRequirement>
            <informationRequirement id="ir2">
              <requiredInput href="#in1"/>
            </informationRequirement>
            <decisionTable><output name="o"/></decisionTable>
          </decision>
          <decision id="b">
            <decisionTable><output name="o"/></decisionTable>
          </decision>
          <inputData id="in1" name="Input One"/>
        </definitions>"##;

        let defs = DmnParser::new().parse_str(xml).unwrap();
        let reqs = &defs.decisions[0].information_requirements;
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].required_decision.as_ref().unwrap().target_id(), "b");
        assert_eq!(reqs[1].required_input.as_ref().unwrap().target_id(), "in1");
        assert_eq!(defs.input_data.len(), 1);
        assert_eq!(defs.input_data[0].name, "Input One");
    }

    #[test]
    fn test_literal_expression() {
        let xml = r#"<definitions id="d">
          <decision id="dec">
            <variable name="result" typeRef="number"/>
            <literalExpression id="le1"><text>a + b</text></literalExpression>
          </decision>
        </definitions>"#;

        let defs = DmnParser::new().parse_str(xml).unwrap();
        let decision = &defs.decisions[0];
        assert_eq!(decision.variable.as_ref().unwrap().name, "result");
        assert_eq!(decision.literal_expression.as_ref().unwrap().text, "a + b");
        assert!(decision.decision_table.is_none());
    }

    #[test]
    fn test_malformed_xml() {
        let result = DmnParser::new().parse_str("<definitions id=\"d\"><decision>");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_root() {
        let result = DmnParser::new().parse_str("<notDefinitions/>");
        assert!(result.is_err());

        let result = DmnParser::new().parse_str("");
        assert!(result.is_err());
    }
}
