//! End-to-end evaluation tests
//!
//! Deploy real DMN XML into the in-memory repository and drive the engine
//! through it, covering each hit policy's observable contract.

use std::collections::HashMap;
use std::sync::Arc;

use verdict_core::Value;
use verdict_engine::{Engine, EngineError, EvaluateRequest};
use verdict_parser::{DmnParser, Validator};
use verdict_repository::{DefinitionRepository, MemoryRepository, NewDefinition};

const AGE_TABLE: &str = r#"<definitions id="defs_age" name="Age Rules">
  <decision id="ageCategory" name="Age Category">
    <decisionTable hitPolicy="UNIQUE">
      <input id="i1"><inputExpression><text>age</text></inputExpression></input>
      <output id="o1" name="category"/>
      <rule id="minor"><inputEntry><text>&lt; 18</text></inputEntry><outputEntry><text>"minor"</text></outputEntry></rule>
      <rule id="adult"><inputEntry><text>[18..65]</text></inputEntry><outputEntry><text>"adult"</text></outputEntry></rule>
      <rule id="senior"><inputEntry><text>&gt; 65</text></inputEntry><outputEntry><text>"senior"</text></outputEntry></rule>
    </decisionTable>
  </decision>
</definitions>"#;

async fn deploy(repo: &MemoryRepository, xml: &str) {
    let parsed = DmnParser::new().parse_str(xml).unwrap();
    let errors = Validator::new().validate(&parsed);
    assert!(errors.is_empty(), "fixture must validate: {errors:?}");

    let key = parsed
        .decisions
        .first()
        .map(|d| d.id.clone())
        .unwrap_or_else(|| parsed.id.clone());

    repo.deploy(NewDefinition {
        key,
        name: parsed.name.clone(),
        source: xml.to_string(),
        parsed_model: parsed,
        tenant_id: String::new(),
    })
    .await
    .unwrap();
}

fn request(decision_key: &str, variables: HashMap<String, Value>) -> EvaluateRequest {
    EvaluateRequest {
        decision_key: decision_key.to_string(),
        version: None,
        variables,
        tenant_id: String::new(),
    }
}

fn age(n: i64) -> HashMap<String, Value> {
    HashMap::from([("age".to_string(), Value::Int(n))])
}

#[tokio::test]
async fn test_unique_happy_path() {
    let repo = Arc::new(MemoryRepository::new());
    deploy(&repo, AGE_TABLE).await;
    let engine = Engine::new(repo);

    let result = engine.evaluate(&request("ageCategory", age(30))).await.unwrap();

    assert_eq!(result.decision_key, "ageCategory");
    assert_eq!(result.decision_name, "Age Category");
    assert_eq!(result.version, 1);
    assert_eq!(result.outputs.len(), 1);
    assert_eq!(result.outputs[0]["category"], Value::String("adult".to_string()));
    assert_eq!(result.matched_rules, vec!["adult"]);
    assert!(result.duration_ns >= 0);
}

#[tokio::test]
async fn test_unique_boundaries() {
    let repo = Arc::new(MemoryRepository::new());
    deploy(&repo, AGE_TABLE).await;
    let engine = Engine::new(repo);

    for (value, expected) in [(17, "minor"), (18, "adult"), (65, "adult"), (66, "senior")] {
        let result = engine.evaluate(&request("ageCategory", age(value))).await.unwrap();
        assert_eq!(
            result.outputs[0]["category"],
            Value::String(expected.to_string()),
            "age {value}"
        );
    }
}

#[tokio::test]
async fn test_unique_violation() {
    let xml = r#"<definitions id="defs_overlap">
      <decision id="overlap" name="Overlapping">
        <decisionTable hitPolicy="UNIQUE">
          <input><inputExpression><text>age</text></inputExpression></input>
          <output name="out"/>
          <rule id="r1"><inputEntry><text>&gt; 10</text></inputEntry><outputEntry><text>"a"</text></outputEntry></rule>
          <rule id="r2"><inputEntry><text>&gt; 20</text></inputEntry><outputEntry><text>"b"</text></outputEntry></rule>
        </decisionTable>
      </decision>
    </definitions>"#;

    let repo = Arc::new(MemoryRepository::new());
    deploy(&repo, xml).await;
    let engine = Engine::new(repo);

    let err = engine.evaluate(&request("overlap", age(30))).await.unwrap_err();
    assert!(matches!(err, EngineError::HitPolicyViolation { matched: 2 }));
}

#[tokio::test]
async fn test_first_short_circuit() {
    let xml = r#"<definitions id="defs_first">
      <decision id="firstMatch" name="First Match">
        <decisionTable hitPolicy="FIRST">
          <input><inputExpression><text>age</text></inputExpression></input>
          <output name="out"/>
          <rule id="r1"><inputEntry><text>&gt; 10</text></inputEntry><outputEntry><text>"a"</text></outputEntry></rule>
          <rule id="r2"><inputEntry><text>&gt; 20</text></inputEntry><outputEntry><text>"b"</text></outputEntry></rule>
          <rule id="r3"><inputEntry><text>&gt; 30</text></inputEntry><outputEntry><text>"c"</text></outputEntry></rule>
        </decisionTable>
      </decision>
    </definitions>"#;

    let repo = Arc::new(MemoryRepository::new());
    deploy(&repo, xml).await;
    let engine = Engine::new(repo);

    let result = engine.evaluate(&request("firstMatch", age(100))).await.unwrap();

    assert_eq!(result.outputs.len(), 1);
    assert_eq!(result.outputs[0]["out"], Value::String("a".to_string()));
    assert_eq!(result.matched_rules.len(), 1);
}

#[tokio::test]
async fn test_collect_sum() {
    let xml = r#"<definitions id="defs_sum">
      <decision id="bonusPoints" name="Bonus Points">
        <decisionTable hitPolicy="COLLECT" aggregation="SUM">
          <input><inputExpression><text>order</text></inputExpression></input>
          <output name="points"/>
          <rule id="r1"><inputEntry><text>-</text></inputEntry><outputEntry><text>5</text></outputEntry></rule>
          <rule id="r2"><inputEntry><text>-</text></inputEntry><outputEntry><text>7</text></outputEntry></rule>
        </decisionTable>
      </decision>
    </definitions>"#;

    let repo = Arc::new(MemoryRepository::new());
    deploy(&repo, xml).await;
    let engine = Engine::new(repo);

    let vars = HashMap::from([("order".to_string(), Value::Int(1))]);
    let result = engine.evaluate(&request("bonusPoints", vars)).await.unwrap();

    assert_eq!(result.outputs.len(), 1);
    assert_eq!(result.outputs[0]["sum"], Value::Number(12.0));
    assert_eq!(result.matched_rules, vec!["r1", "r2"]);
}

#[tokio::test]
async fn test_collect_without_aggregation_returns_all_rows() {
    let xml = r#"<definitions id="defs_collect">
      <decision id="labels" name="Labels">
        <decisionTable hitPolicy="COLLECT">
          <input><inputExpression><text>age</text></inputExpression></input>
          <output name="label"/>
          <rule id="r1"><inputEntry><text>&gt; 10</text></inputEntry><outputEntry><text>"over ten"</text></outputEntry></rule>
          <rule id="r2"><inputEntry><text>&gt; 20</text></inputEntry><outputEntry><text>"over twenty"</text></outputEntry></rule>
        </decisionTable>
      </decision>
    </definitions>"#;

    let repo = Arc::new(MemoryRepository::new());
    deploy(&repo, xml).await;
    let engine = Engine::new(repo);

    let result = engine.evaluate(&request("labels", age(25))).await.unwrap();
    assert_eq!(result.outputs.len(), 2);
    assert_eq!(result.outputs[0]["label"], Value::String("over ten".to_string()));
    assert_eq!(result.outputs[1]["label"], Value::String("over twenty".to_string()));
}

#[tokio::test]
async fn test_string_list_matching() {
    let xml = r#"<definitions id="defs_colors">
      <decision id="colorGroup" name="Color Group">
        <decisionTable hitPolicy="FIRST">
          <input><inputExpression><text>color</text></inputExpression></input>
          <output name="group"/>
          <rule id="warm"><inputEntry><text>"red","orange"</text></inputEntry><outputEntry><text>"warm"</text></outputEntry></rule>
          <rule id="other"><inputEntry><text>-</text></inputEntry><outputEntry><text>"other"</text></outputEntry></rule>
        </decisionTable>
      </decision>
    </definitions>"#;

    let repo = Arc::new(MemoryRepository::new());
    deploy(&repo, xml).await;
    let engine = Engine::new(repo);

    let red = HashMap::from([("color".to_string(), Value::from("red"))]);
    let result = engine.evaluate(&request("colorGroup", red)).await.unwrap();
    assert_eq!(result.outputs[0]["group"], Value::String("warm".to_string()));

    let blue = HashMap::from([("color".to_string(), Value::from("blue"))]);
    let result = engine.evaluate(&request("colorGroup", blue)).await.unwrap();
    assert_eq!(result.outputs[0]["group"], Value::String("other".to_string()));
}

#[tokio::test]
async fn test_evaluates_requested_version() {
    let repo = Arc::new(MemoryRepository::new());
    deploy(&repo, AGE_TABLE).await;
    deploy(&repo, AGE_TABLE).await;
    let engine = Engine::new(repo);

    let latest = engine.evaluate(&request("ageCategory", age(30))).await.unwrap();
    assert_eq!(latest.version, 2);

    let mut pinned = request("ageCategory", age(30));
    pinned.version = Some(1);
    let result = engine.evaluate(&pinned).await.unwrap();
    assert_eq!(result.version, 1);

    // Version zero means latest
    pinned.version = Some(0);
    let result = engine.evaluate(&pinned).await.unwrap();
    assert_eq!(result.version, 2);
}

#[tokio::test]
async fn test_unknown_definition_is_not_found() {
    let repo = Arc::new(MemoryRepository::new());
    let engine = Engine::new(repo);

    let err = engine.evaluate(&request("missing", age(1))).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn test_literal_expression_is_unsupported() {
    let xml = r#"<definitions id="defs_literal">
      <decision id="literal" name="Literal">
        <literalExpression><text>a + b</text></literalExpression>
      </decision>
    </definitions>"#;

    let repo = Arc::new(MemoryRepository::new());
    deploy(&repo, xml).await;
    let engine = Engine::new(repo);

    let err = engine.evaluate(&request("literal", age(1))).await.unwrap_err();
    assert!(matches!(err, EngineError::LiteralExpressionUnsupported));
}

#[tokio::test]
async fn test_falls_back_to_first_decision() {
    let repo = Arc::new(MemoryRepository::new());
    deploy(&repo, AGE_TABLE).await;
    let engine = Engine::new(repo.clone());

    // The stored key is "ageCategory"; evaluating it with a model whose
    // decisions don't contain the key would fall back to the first
    // decision. Simulate by storing under a different key.
    let parsed = DmnParser::new().parse_str(AGE_TABLE).unwrap();
    repo.deploy(NewDefinition {
        key: "aliasKey".to_string(),
        name: "Alias".to_string(),
        source: AGE_TABLE.to_string(),
        parsed_model: parsed,
        tenant_id: String::new(),
    })
    .await
    .unwrap();

    let result = engine.evaluate(&request("aliasKey", age(30))).await.unwrap();
    assert_eq!(result.decision_name, "Age Category");
    assert_eq!(result.outputs[0]["category"], Value::String("adult".to_string()));
}

#[tokio::test]
async fn test_multi_input_rule_requires_all_cells() {
    let xml = r#"<definitions id="defs_multi">
      <decision id="loan" name="Loan">
        <decisionTable hitPolicy="UNIQUE">
          <input><inputExpression><text>age</text></inputExpression></input>
          <input><inputExpression><text>income</text></inputExpression></input>
          <output name="approved"/>
          <rule id="ok"><inputEntry><text>&gt;= 18</text></inputEntry><inputEntry><text>&gt;= 30000</text></inputEntry><outputEntry><text>true</text></outputEntry></rule>
        </decisionTable>
      </decision>
    </definitions>"#;

    let repo = Arc::new(MemoryRepository::new());
    deploy(&repo, xml).await;
    let engine = Engine::new(repo);

    let both = HashMap::from([
        ("age".to_string(), Value::Int(30)),
        ("income".to_string(), Value::Int(50000)),
    ]);
    let result = engine.evaluate(&request("loan", both)).await.unwrap();
    assert_eq!(result.outputs[0]["approved"], Value::Bool(true));

    // Missing one variable is a miss for the whole rule
    let partial = HashMap::from([("age".to_string(), Value::Int(30))]);
    let result = engine.evaluate(&request("loan", partial)).await.unwrap();
    assert!(result.outputs.is_empty());
    assert!(result.matched_rules.is_empty());
}
