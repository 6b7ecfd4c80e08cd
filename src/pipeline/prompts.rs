//! Prompt templates for the completion service
//!
//! Placeholders are `{name}`; anything in braces that isn't a supplied
//! variable (such as a JSON example) is left alone.

/// First line of the synthesis prompt.
pub const SYNTHESIS_HEADER: &str =
    "You are a Neo4j developer translating user questions into Cypher";

/// First line of the repair prompt.
pub const REPAIR_HEADER: &str = "You are an expert Neo4j developer reviewing a Cypher statement";

/// First line of the answer prompt.
pub const ANSWER_HEADER: &str = "Use the following context to answer the following question.";

pub(crate) const SYNTHESIS: &str = "You are a Neo4j developer translating user questions into Cypher
to answer questions about the data in the graph.
Convert the user's question into a Cypher statement based on the schema.

You must:
* Only use the nodes, relationships and properties mentioned in the schema.
* When required, use `IS NOT NULL` to check for property existence.
* Use the `elementId()` function to return the unique identifier for a node or relationship
  as `{id_field}`.
* Include extra properties that may help provide a more informative answer.
* Limit the maximum number of results to {limit}.
* Respond with only a Cypher statement. No preamble.

Example Question: Who authored the paper about transformers?
Example Cypher:
MATCH (p:Paper)<-[:AUTHORED]-(a:Person)
WHERE toLower(p.title) CONTAINS 'transformer'
RETURN p.title AS Paper, collect(a.name) AS Authors, elementId(p) AS {id_field}
LIMIT {limit}

Schema:
{schema}

Question:
{question}
";

pub(crate) const REPAIR: &str = "You are an expert Neo4j developer reviewing a Cypher statement
written to answer the question below. Check it against the schema and fix
every problem you find.

Check that:
* only node labels, relationship types and properties from the schema are used
* relationship directions match the schema
* every variable is defined before it is used and the syntax is valid
* node and relationship identifiers are returned as `{id_field}` using `elementId()`
* the statement actually answers the question

Errors reported against the current statement (N/A means it has not been checked yet):
{errors}

Respond with a JSON object and nothing else:
{\"cypher\": \"<the corrected statement>\", \"errors\": [\"<each problem you found>\"]}
If the statement is already correct, return it unchanged with an empty errors list.

Schema:
{schema}

Question:
{question}

Cypher:
{cypher}
";

pub(crate) const ANSWER: &str = "Use the following context to answer the following question.
The context is provided by an authoritative source, you must never doubt it.
You must use the context to answer the question but may also use previous
training knowledge to phrase a more helpful answer, never to contradict it.

Make the answer sound like it is a response to the question.
Do not mention that you have based your response on the context, a database
or any other source.

Here is an example:

Question: Who played Woody in Toy Story?
Context: {\"role\": \"Woody\", \"actor\": \"Tom Hanks\"}
Response: Tom Hanks played Woody in Toy Story.

If the context is \"I don't know\", say that you don't know and don't try to
make up an answer. You may also ask for clarification.

Question:
{question}

Context:
{context}
";

/// Substitute `{name}` placeholders in a single pass.
///
/// Substituted values are never rescanned, so a question that happens to
/// contain `{schema}` stays literal.
pub(crate) fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
